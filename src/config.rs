use crate::stream_body_as::StreamBodyAsOptions;
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

/// Server settings, read from the command line with environment fallbacks.
#[derive(Debug, Clone, Parser)]
#[command(name = "author-streams", about = "Author REST and NDJSON streaming service")]
pub struct ServerConfig {
    /// Address to listen on.
    #[arg(long, env = "AUTHORS_LISTEN", default_value = "127.0.0.1:8080")]
    pub listen: SocketAddr,

    /// Number of generated authors loaded into the in-memory repository.
    #[arg(long, env = "AUTHORS_SEED_COUNT", default_value_t = 1000)]
    pub seed_count: usize,

    /// Seed for the author generator.
    #[arg(long, env = "AUTHORS_SEED", default_value_t = 1)]
    pub seed: u64,

    /// Coalesce this many ready records into one body chunk.
    #[arg(long, env = "AUTHORS_BUFFERING_ITEMS")]
    pub buffering_items: Option<usize>,

    /// Coalesce streamed records into body chunks of this many bytes.
    #[arg(long, env = "AUTHORS_BUFFERING_BYTES", conflicts_with = "buffering_items")]
    pub buffering_bytes: Option<usize>,

    /// Artificial per-record delay of the reactive repository, in milliseconds.
    #[arg(long, env = "AUTHORS_REACTIVE_DELAY_MS", default_value_t = 0)]
    pub reactive_delay_ms: u64,

    /// Capacity of the channel between a blocking query and the response body.
    #[arg(long, env = "AUTHORS_CHANNEL_CAPACITY", default_value_t = crate::DEFAULT_CHANNEL_CAPACITY)]
    pub channel_capacity: usize,
}

impl ServerConfig {
    pub fn reactive_delay(&self) -> Duration {
        Duration::from_millis(self.reactive_delay_ms)
    }

    pub fn stream_options(&self) -> StreamBodyAsOptions {
        let options = StreamBodyAsOptions::new().record_channel_capacity(self.channel_capacity);
        match (self.buffering_items, self.buffering_bytes) {
            (Some(items), _) => options.buffering_ready_items(items),
            (None, Some(bytes)) => options.buffering_bytes(bytes),
            (None, None) => options,
        }
    }
}
