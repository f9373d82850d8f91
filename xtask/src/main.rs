use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{ensure, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const LAMBDA_PACKAGE: &str = "serverless_handler_lambda";
const LAMBDA_BINARIES: &[&str] = &["hello_lambda"];
const LAMBDA_TARGET: &str = "x86_64-unknown-linux-gnu";
const DIST_DIR: &str = "dist";

const CHECK_STEPS: &[&[&str]] = &[
    &["fmt", "--all", "--", "--check"],
    &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    &["test", "--workspace"],
];

#[derive(Parser)]
#[command(
    name = "xtask",
    about = "Checks and Lambda packaging for the serverless handler workspace"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run CI jobs
    Ci {
        #[arg(value_enum, default_value_t = CiJob::Check)]
        job: CiJob,
    },
    /// Build the Lambda binaries and zip each one as `bootstrap`
    ServerlessPackage {
        #[arg(long, default_value = LAMBDA_TARGET)]
        target: String,
        #[arg(value_enum, long, default_value_t = BuildProfile::Release)]
        profile: BuildProfile,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum CiJob {
    /// fmt, clippy and the workspace tests
    Check,
    /// Package for the host target with a debug build
    Package,
    All,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BuildProfile {
    Debug,
    Release,
}

fn cargo(args: &[&str]) -> Result<()> {
    eprintln!("$ cargo {}", args.join(" "));
    let status = Command::new("cargo")
        .args(args)
        .status()
        .context("could not spawn cargo")?;
    ensure!(status.success(), "`cargo {}` exited with {status}", args.join(" "));
    Ok(())
}

fn check() -> Result<()> {
    CHECK_STEPS.iter().try_for_each(|args| cargo(args))
}

fn build_args(target: &str, profile: BuildProfile) -> Vec<&str> {
    let mut args = vec!["build", "-p", LAMBDA_PACKAGE, "--target", target];
    for bin in LAMBDA_BINARIES {
        args.extend(["--bin", *bin]);
    }
    if profile == BuildProfile::Release {
        args.push("--release");
    }
    args
}

fn artifact_path(target: &str, profile: BuildProfile, bin: &str) -> PathBuf {
    let profile_dir = match profile {
        BuildProfile::Debug => "debug",
        BuildProfile::Release => "release",
    };
    let file_name = if target.contains("windows") {
        format!("{bin}.exe")
    } else {
        bin.to_string()
    };
    Path::new("target")
        .join(target)
        .join(profile_dir)
        .join(file_name)
}

/// Lambda custom runtimes expect a single executable named `bootstrap`.
fn write_bootstrap_zip(binary_path: &Path, zip_path: &Path) -> Result<()> {
    let binary = fs::read(binary_path)
        .with_context(|| format!("missing lambda binary at {}", binary_path.display()))?;
    let mut zip = ZipWriter::new(
        File::create(zip_path).with_context(|| format!("cannot create {}", zip_path.display()))?,
    );
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o755);
    zip.start_file("bootstrap", options)?;
    zip.write_all(&binary)?;
    zip.finish()?;
    Ok(())
}

fn package(target: &str, profile: BuildProfile) -> Result<Vec<PathBuf>> {
    cargo(&build_args(target, profile))?;

    let dist_dir = Path::new(DIST_DIR);
    fs::create_dir_all(dist_dir).context("cannot create dist directory")?;
    LAMBDA_BINARIES
        .iter()
        .map(|bin| {
            let zip_path = dist_dir.join(format!("{bin}.zip"));
            write_bootstrap_zip(&artifact_path(target, profile, bin), &zip_path)?;
            Ok(zip_path)
        })
        .collect()
}

fn host_target() -> Result<String> {
    let output = Command::new("rustc")
        .arg("-vV")
        .output()
        .context("could not spawn rustc")?;
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .find_map(|line| line.strip_prefix("host: "))
        .map(str::to_string)
        .context("`rustc -vV` did not report a host triple")
}

fn main() -> Result<()> {
    let packaged = match Cli::parse().command {
        Commands::Ci { job } => {
            if matches!(job, CiJob::Check | CiJob::All) {
                check()?;
            }
            if matches!(job, CiJob::Package | CiJob::All) {
                package(&host_target()?, BuildProfile::Debug)?
            } else {
                Vec::new()
            }
        }
        Commands::ServerlessPackage { target, profile } => package(&target, profile)?,
    };

    for path in packaged {
        eprintln!("packaged {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use zip::ZipArchive;

    use super::*;

    #[test]
    fn release_build_names_every_lambda_binary() {
        assert_eq!(
            build_args(LAMBDA_TARGET, BuildProfile::Release),
            vec![
                "build",
                "-p",
                "serverless_handler_lambda",
                "--target",
                "x86_64-unknown-linux-gnu",
                "--bin",
                "hello_lambda",
                "--release",
            ]
        );
        assert!(!build_args(LAMBDA_TARGET, BuildProfile::Debug).contains(&"--release"));
    }

    #[test]
    fn artifact_path_follows_cargo_layout() {
        assert_eq!(
            artifact_path("aarch64-unknown-linux-gnu", BuildProfile::Debug, "hello_lambda"),
            Path::new("target/aarch64-unknown-linux-gnu/debug/hello_lambda")
        );
        assert_eq!(
            artifact_path("x86_64-pc-windows-msvc", BuildProfile::Release, "hello_lambda"),
            Path::new("target/x86_64-pc-windows-msvc/release/hello_lambda.exe")
        );
    }

    #[test]
    fn zip_holds_a_single_executable_bootstrap() {
        let dir = tempfile::tempdir().expect("tempdir");
        let binary_path = dir.path().join("hello_lambda");
        let zip_path = dir.path().join("hello_lambda.zip");
        fs::write(&binary_path, b"\x7fELF fake binary").expect("write binary");

        write_bootstrap_zip(&binary_path, &zip_path).expect("zip should be written");

        let mut archive =
            ZipArchive::new(File::open(&zip_path).expect("open zip")).expect("read zip");
        assert_eq!(archive.len(), 1);
        let mut entry = archive.by_name("bootstrap").expect("bootstrap entry");
        assert_eq!(entry.unix_mode().map(|mode| mode & 0o777), Some(0o755));
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents).expect("read entry");
        assert_eq!(contents, b"\x7fELF fake binary");
    }

    #[test]
    fn missing_binary_is_reported_with_its_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let binary_path = dir.path().join("absent");

        let error = write_bootstrap_zip(&binary_path, &dir.path().join("out.zip"))
            .expect_err("missing binary should fail");

        assert!(error.to_string().contains(&binary_path.display().to_string()));
    }
}
