//! `gatedeck konnect dump`

use gatedeck_core::{DumpRequest, FetchOptions, WriteConfig, run_dump};
use tracing::info;

use crate::cli::{DumpArgs, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output::FileWriter;

pub async fn handle(args: DumpArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (managed, credentials) = config::resolve_managed(global)?;

    let request = DumpRequest {
        managed,
        credentials,
        control_plane: args.control_plane,
        fetch: FetchOptions {
            exclude_consumers: !args.include_consumers,
            ..FetchOptions::default()
        },
        write: WriteConfig {
            output: args.output_file,
            format: args.format,
            with_id: args.with_id,
        },
    };

    let summary = run_dump(request, &FileWriter).await?;
    info!(
        control_plane = %summary.control_plane_id,
        entities = summary.entities,
        "dump finished"
    );
    Ok(())
}
