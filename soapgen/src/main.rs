use std::{fs, path::PathBuf, time::Duration};

use structopt::StructOpt;
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use soapgen_codegen::{self as codegen, Config, Section};
use soapgen_wsdl::UnsupportedPolicy;

#[derive(Debug, Error)]
enum Error {
    #[error("Error generating code")]
    Codegen(#[from] codegen::Error),

    #[error("I/O error")]
    IoError(#[from] std::io::Error),

    #[error("Error writing {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(StructOpt)]
#[structopt(about = "Generates a Rust SOAP client from a WSDL document")]
struct Args {
    /// File receiving the assembled client.
    #[structopt(short, long, default_value = "./output.rs", parse(from_os_str))]
    output: PathBuf,

    /// Name of the generated package, shown in its header.
    #[structopt(short, long, default_value = "myservice")]
    package: String,

    /// Write each section to its own file in this directory instead.
    #[structopt(long, parse(from_os_str))]
    split: Option<PathBuf>,

    /// Fail on schema constructs that would otherwise be degraded.
    #[structopt(long)]
    strict: bool,

    /// Seconds allowed for fetching each remote document.
    #[structopt(long, default_value = "30")]
    timeout: u64,

    /// Seconds the generated client waits for each call.
    #[structopt(long, default_value = "30")]
    request_timeout: u64,

    /// URL or path of the WSDL document.
    input: String,
}

impl Args {
    fn config(&self) -> Config {
        let policy = if self.strict {
            UnsupportedPolicy::Abort
        } else {
            UnsupportedPolicy::Degrade
        };

        Config::new()
            .with_package(self.package.as_str())
            .with_policy(policy)
            .with_timeout(Some(Duration::from_secs(self.timeout)))
            .with_request_timeout(Duration::from_secs(self.request_timeout))
    }
}

fn write(path: PathBuf, contents: &str) -> Result<(), Error> {
    fs::write(&path, contents).map_err(|source| Error::Write { path: path.clone(), source })?;
    info!("wrote {}", path.display());
    Ok(())
}

#[paw::main]
fn main(args: Args) -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let sections = codegen::from_url(&args.input, &args.config())?;

    if !sections.unsupported().is_empty() {
        warn!(
            count = sections.unsupported().len(),
            "some schema constructs were replaced by simpler types"
        );
    }

    match &args.split {
        Some(directory) => {
            fs::create_dir_all(directory).map_err(|source| Error::Write {
                path: directory.clone(),
                source,
            })?;

            for section in Section::ALL {
                let text = sections.get(section)?;
                write(directory.join(format!("{}.rs", section.name())), text)?;
            }
        }

        None => write(args.output.clone(), &sections.assemble()?)?,
    }

    Ok(())
}
