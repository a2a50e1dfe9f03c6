use crate::cli::PrepareArgs;
use crate::config::PartialSettings;
use crate::error::{CliError, Result};
use crate::pdb::{DownloadProgress, PdbDownloader};
use crate::utils::progress::CliProgressHandler;
use dockbatch::{
    engine::progress::ProgressReporter,
    workflows::prepare::{
        FailedItem, InputKind, MoleculePreparer, PreparationReport, PreparationRequest,
    },
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

pub async fn run(args: PrepareArgs, settings: &PartialSettings) -> Result<()> {
    let tools = settings.tool_paths(args.reduce.clone());
    let preparer = MoleculePreparer::new(tools, args.output_dir.clone())?;

    let mut request = PreparationRequest {
        receptors: args.receptors.clone(),
        smiles_files: args.smiles_files.clone(),
        sdf: args.sdf.clone(),
        mol2: args.mol2.clone(),
        pdbqt: args.pdbqt.clone(),
    };
    if request.is_empty() && args.pdb_ids.is_empty() {
        return Err(CliError::Argument(
            "nothing to prepare; pass --pdb-id, --receptor, --smiles, --sdf, --mol2 or --pdbqt"
                .to_string(),
        ));
    }

    let mut download_failures = Vec::new();
    if !args.pdb_ids.is_empty() {
        let downloader = PdbDownloader::new()?;
        for code in &args.pdb_ids {
            match download(&downloader, code, &preparer).await {
                Ok(path) => request.receptors.push(path),
                Err(e) => {
                    warn!("Download of PDB entry {} failed: {}", code, e);
                    download_failures.push(FailedItem {
                        source: code.clone(),
                        kind: InputKind::Receptor,
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Preparing {} input(s)...", request.len());
    let mut report: PreparationReport =
        tokio::task::block_in_place(|| preparer.prepare(&request, &reporter));
    download_failures.append(&mut report.failed);
    report.failed = download_failures;

    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to serialize report: {}", e)))?;
    println!("{}", json);

    if args.strict && !report.is_complete() {
        return Err(CliError::Incomplete(format!(
            "{} of {} item(s) failed",
            report.failed.len(),
            report.failed.len() + report.prepared.len()
        )));
    }
    Ok(())
}

async fn download(
    downloader: &PdbDownloader,
    code: &str,
    preparer: &MoleculePreparer,
) -> Result<std::path::PathBuf> {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} {msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})",
        )
        .map_err(|e| CliError::Other(e.into()))?
        .progress_chars("#>-"),
    );
    pb.set_draw_target(indicatif::ProgressDrawTarget::stderr_with_hz(2));
    pb.set_message(format!("PDB {}", code));

    let progress_callback = |progress: DownloadProgress| match progress {
        DownloadProgress::Started { total_size } => {
            if let Some(size) = total_size {
                pb.set_length(size);
            }
        }
        DownloadProgress::Downloading { downloaded } => {
            pb.set_position(downloaded);
        }
    };

    match downloader
        .download(code, preparer.output_dir(), progress_callback)
        .await
    {
        Ok(path) => {
            pb.finish_with_message(format!("✓ {}", path.display()));
            Ok(path)
        }
        Err(e) => {
            pb.finish_with_message(format!("✗ PDB {}", code));
            Err(e)
        }
    }
}
