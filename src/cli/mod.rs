use std::path::PathBuf;

#[derive(Debug, PartialEq, Eq)]
pub enum CliAction {
    PrintVersion,
    InitConfig,
    RunServer { config: Option<PathBuf> },
}

pub fn parse_args() -> CliAction {
    // skip executable name
    parse_from(std::env::args().skip(1))
}

pub fn parse_from<I: IntoIterator<Item = String>>(args: I) -> CliAction {
    let mut version_flag = false;
    let mut init_config = false;
    let mut config = None;
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" | "-version" => version_flag = true,
            "--init-config" => init_config = true,
            "--config" | "-c" => config = args.next().map(PathBuf::from),
            other => {
                if let Some(path) = other.strip_prefix("--config=") {
                    config = Some(PathBuf::from(path));
                }
            }
        }
    }
    if version_flag {
        return CliAction::PrintVersion;
    }
    if init_config {
        return CliAction::InitConfig;
    }
    CliAction::RunServer { config }
}

pub fn print_version() {
    println!("MJS Adapter v{}", env!("CARGO_PKG_VERSION"));
}

pub fn init_config_file() {
    use std::fs;
    use std::path::Path;
    let target = Path::new(crate::config::CONFIG_FILE_NAMES[0]);
    if target.exists() {
        eprintln!("{} already exists; aborting --init-config", target.display());
        return;
    }
    if let Err(e) = fs::write(target, crate::config::DEFAULT_CONFIG_TEMPLATE) {
        eprintln!("Failed to write {}: {e}", target.display());
    } else {
        println!("Created {}", target.display());
    }
}
