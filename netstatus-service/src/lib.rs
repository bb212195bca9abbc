use clap::{ArgAction, Parser};
use log::{debug, error, info};
use netstatus::{Indicator, IndicatorOptions, MenuProfile};

#[derive(Parser, Debug)]
#[command(name = "netstatus-service")]
#[command(disable_version_flag = true)]
#[command(version)]
struct Args {
    #[arg(short = 'V', long = "version", action = ArgAction::SetTrue)]
    version: bool,

    /// Menu flavour to render (phone or desktop)
    #[arg(long, default_value = "phone")]
    profile: MenuProfile,

    /// Do not render the Wi-Fi and cellular settings entries
    #[arg(long = "no-settings", action = ArgAction::SetTrue)]
    no_settings: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

impl Args {
    fn options(&self) -> IndicatorOptions {
        IndicatorOptions {
            profile: self.profile,
            show_settings_items: !self.no_settings,
            ..Default::default()
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.version {
        println!("netstatus-service {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let indicator = match Indicator::start(args.options()).await {
        Ok(indicator) => indicator,
        Err(e) => {
            error!("Failed to start: {e}");
            std::process::exit(1);
        }
    };

    let mut snapshots = indicator.subscribe();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                debug!("{} update(s)", snapshot.updates.len());
                info!("Indicator icons: {}", snapshot.view.indicator_icons.join(" "));
            }
        }
    }

    indicator.shutdown().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arguments_map_to_options() {
        let args = Args::parse_from(["netstatus-service", "--profile", "desktop", "--no-settings"]);
        let options = args.options();
        assert_eq!(options.profile, MenuProfile::Desktop);
        assert!(!options.show_settings_items);
        assert!(!args.verbose);
    }

    #[test]
    fn defaults() {
        let args = Args::parse_from(["netstatus-service"]);
        assert_eq!(args.options(), IndicatorOptions::default());
    }

    #[test]
    fn rejects_unknown_profile() {
        assert!(Args::try_parse_from(["netstatus-service", "--profile", "tablet"]).is_err());
    }
}
