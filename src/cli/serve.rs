//! Serve command implementation.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Args;

use crate::error::Result;
use crate::output::{display_path, Printer};
use crate::server;

/// Run the tile upload server
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on (default: from tilex.yaml, else 3000)
    #[arg(long, short)]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Directory uploaded images are stored in (default: from tilex.yaml)
    #[arg(long)]
    pub upload_dir: Option<PathBuf>,

    /// Manifest to read instead of ./tilex.yaml
    #[arg(long)]
    pub manifest: Option<PathBuf>,
}

pub async fn run(args: ServeArgs, printer: &Printer) -> Result<()> {
    let manifest = super::load_manifest(args.manifest.as_deref(), printer)?;
    let port = args.port.unwrap_or(manifest.port);
    let upload_dir = args.upload_dir.unwrap_or(manifest.upload_dir);
    let addr = SocketAddr::new(args.host, port);

    printer.status(
        "Serving",
        &format!("http://{} (uploads in {})", addr, display_path(&upload_dir)),
    );
    server::serve(addr, upload_dir).await
}
