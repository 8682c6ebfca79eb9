use anyhow::Result;
use nb_config::BuildConfig;
use nb_core::nb_println;

pub fn handle_show(config: &BuildConfig) -> Result<()> {
    match &config.source_path {
        Some(path) => {
            nb_println!("# loaded from {}", path.display());
        }
        None => {
            nb_println!("# built-in defaults");
        }
    }
    nb_println!("{}", config.to_yaml()?.trim_end());
    Ok(())
}
