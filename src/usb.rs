use crate::shell::Transport;
use crate::{Duration, Error, READ_TIMEOUT, Timer};
use embassy_time::{TimeoutError, with_timeout};
use embassy_usb::class::cdc_acm::CdcAcmClass;
use embassy_usb::driver::{Driver, EndpointError};

pub const USB_VID: u16 = 0xc0de;
pub const USB_PID: u16 = 0xcafe;
pub const USB_MANUFACTURER: &str = "Pico Console";
pub const USB_PRODUCT: &str = "USB Serial Console";
pub const USB_SERIAL_NUMBER: &str = "123456";
pub const MAX_PACKET_SIZE: u16 = 64;

/// Serial console transport over a USB CDC ACM class.
pub struct CdcTransport<'d, D: Driver<'d>> {
    class: CdcAcmClass<'d, D>,
}

impl<'d, D: Driver<'d>> CdcTransport<'d, D> {
    pub fn new(class: CdcAcmClass<'d, D>) -> Self {
        Self { class }
    }

    /// Waits until the host has configured the device and opened the port.
    pub async fn wait_connection(&mut self) {
        self.class.wait_connection().await;
        while !self.class.dtr() {
            Timer::after(Duration::from_millis(10)).await;
            debug!("Waiting for DTR...");
        }
    }
}

impl<'d, D: Driver<'d>> Transport for CdcTransport<'d, D> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        read_outcome(with_timeout(READ_TIMEOUT, self.class.read_packet(buf)).await)
    }

    async fn write(&mut self, data: &[u8]) -> Result<(), Error> {
        let packet_size = self.class.max_packet_size() as usize;
        for packet in packets(data, packet_size) {
            self.class.write_packet(packet).await?;
        }
        Ok(())
    }
}

const ZERO_LENGTH_PACKET: &[u8] = &[];

/// Splits `data` into packets of at most `size` bytes. A full last packet
/// is followed by a zero-length packet so the host doesn't wait for more.
fn packets(data: &[u8], size: usize) -> impl Iterator<Item = &[u8]> {
    let needs_zlp = !data.is_empty() && data.len() % size == 0;
    data.chunks(size).chain(needs_zlp.then_some(ZERO_LENGTH_PACKET))
}

/// A read that timed out delivered nothing.
fn read_outcome(
    result: Result<Result<usize, EndpointError>, TimeoutError>,
) -> Result<usize, Error> {
    match result {
        Ok(read) => Ok(read?),
        Err(TimeoutError) => Ok(0),
    }
}

#[cfg(feature = "rp")]
mod rp {
    use super::*;
    use embassy_rp::bind_interrupts;
    use embassy_rp::peripherals::USB;
    use embassy_rp::usb::{Driver, InterruptHandler};
    use embassy_usb::class::cdc_acm::State;
    use embassy_usb::{Builder, Config};

    bind_interrupts!(struct Irqs {
        USBCTRL_IRQ => InterruptHandler<USB>;
    });

    /// Builds the USB device and its console CDC ACM class.
    pub fn setup_usb<'d>(
        usb_peripheral: USB,
        state: &'d mut State<'d>,
        config_desc: &'d mut [u8; 256],
        bos_desc: &'d mut [u8; 256],
        control_buf: &'d mut [u8; 64],
    ) -> (
        Builder<'d, Driver<'d, USB>>,
        CdcAcmClass<'d, Driver<'d, USB>>,
    ) {
        let driver = Driver::new(usb_peripheral, Irqs);

        let mut config = Config::new(USB_VID, USB_PID);
        config.manufacturer = Some(USB_MANUFACTURER);
        config.product = Some(USB_PRODUCT);
        config.serial_number = Some(USB_SERIAL_NUMBER);

        let mut builder = Builder::new(
            driver,
            config,
            config_desc,
            bos_desc,
            &mut [],
            control_buf,
        );

        let class = CdcAcmClass::new(&mut builder, state, MAX_PACKET_SIZE);

        (builder, class)
    }
}

#[cfg(feature = "rp")]
pub use rp::setup_usb;
