// src/pipeline/validate.rs

use crate::error::Result;
use crate::models::Config;

/// Validate the configuration and log the effective crawl settings.
pub fn run_validate(config: &Config) -> Result<()> {
    log::info!("Validating configuration...");

    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }

    log::info!("Config OK");
    log::info!("  Site: {} (term {})", config.site.base_url, config.site.term);
    log::info!("  Timeout: {}s", config.crawler.timeout_secs);
    log::info!("  Max concurrent departments: {}", config.crawler.max_concurrent);
    log::info!("  Request delay: {}ms", config.crawler.request_delay_ms);
    log::info!(
        "  Output: {} (partial: {})",
        config.output.file_name,
        config.output.partial_file_name
    );
    Ok(())
}
