use crate::commands::Dispatcher;
use crate::line::{Event, LineAssembler};
use crate::{Error, GREETING, PROMPT, READ_CHUNK};
use heapless::Vec;

/// Byte-oriented channel the console talks over.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Reads whatever is available into `buf`. Returns `Ok(0)` when nothing
    /// arrived within the transport's read timeout.
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error>;

    /// Writes all of `data` before returning.
    async fn write(&mut self, data: &[u8]) -> Result<(), Error>;
}

/// Shell handler that processes commands from a serial transport.
///
/// Owns the line being typed and the transport handle; nothing is shared
/// with other tasks.
pub struct Shell<T: Transport> {
    transport: T,
    assembler: LineAssembler,
    dispatcher: Dispatcher,
    echo: Vec<u8, READ_CHUNK>,
}

impl<T: Transport> Shell<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            assembler: LineAssembler::new(),
            dispatcher: Dispatcher::new(),
            echo: Vec::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Bytes typed so far on the current line.
    pub fn pending_line(&self) -> &[u8] {
        self.assembler.pending()
    }

    /// Starts a fresh session: drops any half-typed line and sends the
    /// greeting followed by the first prompt.
    pub async fn send_welcome(&mut self) -> Result<(), Error> {
        self.assembler.reset();
        self.echo.clear();
        self.transport.write(GREETING).await?;
        self.transport.write(PROMPT).await
    }

    /// Runs the session until the transport fails.
    pub async fn run(&mut self) -> Result<(), Error> {
        self.send_welcome().await?;
        info!("console session started");

        let mut read_buf = [0; READ_CHUNK];

        loop {
            match self.transport.read(&mut read_buf).await {
                Ok(0) => {} // Read timed out, nothing to do
                Ok(n) => self.process_input(&read_buf[..n]).await?,
                Err(e) => {
                    warn!("transport read failed: {}", e);
                    return Err(e);
                }
            }
        }
    }

    /// Feeds a chunk of received bytes through the line assembler, writing
    /// echoes and command replies in input order.
    pub async fn process_input(&mut self, data: &[u8]) -> Result<(), Error> {
        for &byte in data {
            match self.assembler.feed(byte) {
                Event::LineComplete(line) => {
                    self.flush_echo().await?;
                    debug!("line complete: {=[u8]:a}", &line[..]);

                    let reply = self.dispatcher.dispatch(&line);
                    for fragment in reply.fragments() {
                        if !fragment.is_empty() {
                            self.transport.write(fragment).await?;
                        }
                    }
                }
                event => self.queue_echo(event.echo()).await?,
            }
        }

        self.flush_echo().await
    }

    /// Echoes are batched per input chunk instead of one write per byte.
    async fn queue_echo(&mut self, bytes: &[u8]) -> Result<(), Error> {
        if bytes.is_empty() {
            return Ok(());
        }
        if self.echo.len() + bytes.len() > self.echo.capacity() {
            self.flush_echo().await?;
        }
        let _ = self.echo.extend_from_slice(bytes);
        Ok(())
    }

    async fn flush_echo(&mut self) -> Result<(), Error> {
        if self.echo.is_empty() {
            return Ok(());
        }
        let result = self.transport.write(&self.echo).await;
        self.echo.clear();
        result
    }
}
