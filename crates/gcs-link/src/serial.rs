use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::{info, warn};

use gcs_config::WireFrame;

use crate::wire::{self, MsgType, CHECKSUM_LEN, HEADER_LEN};

/// Serial link to the flight controller.
///
/// One request completes before the next begins; the link owns the port and
/// is the single reader and writer on it.
pub struct ConfigLink {
    port: SerialStream,
    dev: String,
    response_timeout: Duration,
}

impl ConfigLink {
    pub fn open(dev: &str, baud: u32, response_timeout: Duration) -> Result<Self> {
        let port = tokio_serial::new(dev, baud)
            .open_native_async()
            .with_context(|| format!("open serial device {}", dev))?;
        Ok(Self {
            port,
            dev: dev.to_string(),
            response_timeout,
        })
    }

    pub fn device(&self) -> &str {
        &self.dev
    }

    /// Push a configuration record to the controller.
    pub async fn send_config(&mut self, frame: &WireFrame) -> Result<()> {
        let payload = wire::encode_frame(frame)?;
        let msg = wire::frame_message(MsgType::SetConfig, &payload);
        self.port.write_all(&msg).await.context("write config")?;
        self.port.flush().await?;
        info!("link: sent configuration ({} bytes) to {}", msg.len(), self.dev);
        Ok(())
    }

    /// Ask the controller for its current configuration and wait for the
    /// answer.
    pub async fn request_config(&mut self) -> Result<WireFrame> {
        let msg = wire::frame_message(MsgType::RequestConfig, &[]);
        self.port.write_all(&msg).await.context("write config request")?;
        self.port.flush().await?;

        let payload = self.await_message(MsgType::ConfigData).await?;
        let frame = wire::decode_frame(&payload)?;
        info!("link: received configuration from {}", self.dev);
        Ok(frame)
    }

    /// Ask for the firmware version banner.
    pub async fn request_version(&mut self) -> Result<String> {
        let msg = wire::frame_message(MsgType::RequestVersion, &[]);
        self.port.write_all(&msg).await.context("write version request")?;
        self.port.flush().await?;

        let payload = self.await_message(MsgType::Version).await?;
        Ok(String::from_utf8_lossy(&payload).into_owned())
    }

    /// Read messages until one of the wanted type arrives, discarding
    /// anything else (telemetry shares the same port).
    async fn await_message(&mut self, want: MsgType) -> Result<Vec<u8>> {
        let deadline = tokio::time::Instant::now() + self.response_timeout;
        loop {
            let remaining = deadline
                .checked_duration_since(tokio::time::Instant::now())
                .context("timed out waiting for controller response")?;
            let (kind, payload) = tokio::time::timeout(remaining, self.read_message())
                .await
                .context("timed out waiting for controller response")??;
            if kind == want {
                return Ok(payload);
            }
            warn!("link: ignoring unexpected {:?} message", kind);
        }
    }

    async fn read_message(&mut self) -> Result<(MsgType, Vec<u8>)> {
        let mut hdr = [0u8; HEADER_LEN];
        self.port.read_exact(&mut hdr).await.context("read header")?;
        let (kind, len) = wire::parse_header(&hdr)?;

        let mut rest = vec![0u8; len + CHECKSUM_LEN];
        self.port.read_exact(&mut rest).await.context("read payload")?;
        let (payload, trailer) = rest.split_at(len);
        wire::verify_checksum(payload, trailer)?;

        Ok((kind, payload.to_vec()))
    }
}
