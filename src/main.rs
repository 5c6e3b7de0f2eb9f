#![no_std]
#![no_main]

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_futures::join::join;
use embassy_rp::block::ImageDef;
use embassy_usb::class::cdc_acm::State;
use pico_console::Shell;
use pico_console::usb::{CdcTransport, setup_usb};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

#[unsafe(link_section = ".start_block")]
#[used]
pub static IMAGE_DEF: ImageDef = ImageDef::secure_exe();

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    info!("Pico console starting");

    static STATE: StaticCell<State> = StaticCell::new();
    static CONFIG_DESC: StaticCell<[u8; 256]> = StaticCell::new();
    static BOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
    static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

    let (builder, class) = setup_usb(
        p.USB,
        STATE.init(State::new()),
        CONFIG_DESC.init([0; 256]),
        BOS_DESC.init([0; 256]),
        CONTROL_BUF.init([0; 64]),
    );
    let mut usb = builder.build();

    let mut shell = Shell::new(CdcTransport::new(class));

    let console = async {
        loop {
            shell.transport_mut().wait_connection().await;
            info!("Host connected");

            if let Err(e) = shell.run().await {
                warn!("Console session ended: {}", e);
            }
        }
    };

    join(usb.run(), console).await;
}
