use anyhow::{anyhow, Result};
use tracing::Level;

use super::info::{APP_ID, VERSION};

pub fn init(verbosity: u8) -> Result<()> {
    // Enable logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level_for(verbosity))
        .try_init()
        .map_err(|err| anyhow!(err))?;

    tracing::debug!(app = APP_ID, version = VERSION, "logging ready");
    Ok(())
}

fn level_for(verbosity: u8) -> Level {
    match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_raises_the_level() {
        assert_eq!(level_for(0), Level::WARN);
        assert_eq!(level_for(1), Level::INFO);
        assert_eq!(level_for(2), Level::DEBUG);
        assert_eq!(level_for(9), Level::TRACE);
    }
}
