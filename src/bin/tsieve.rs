use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};

use transparency_sieve::store::{LocalStore, ObjectStore};
use transparency_sieve::{
    check_directory, check_file, logging, summarize, transfer, CheckResult, Outcome,
    TransferOptions,
};

#[derive(Parser)]
#[command(
    name = "tsieve",
    about = "Detect image transparency and copy opaque images between buckets",
    version,
    after_help = "Simple usage: tsieve check <image-or-dir>\n\n\
                  Transfer: tsieve transfer --src-bucket-name SRC --dst-bucket-name DST\n\
                  (add --root <dir> to treat subdirectories of <dir> as buckets)"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Also append log records to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Classify an image file or every image in a directory
    Check {
        /// Input image file or directory
        input: PathBuf,
    },
    /// Copy opaque images from the source bucket to the destination bucket
    Transfer(TransferArgs),
    /// Detect faces in an image and save an annotated copy
    #[cfg(feature = "faces")]
    Faces(FacesArgs),
}

#[derive(Args)]
struct TransferArgs {
    /// Source bucket name
    #[arg(long, alias = "src-bucket_name")]
    src_bucket_name: String,

    /// Destination bucket name
    #[arg(long)]
    dst_bucket_name: String,

    /// Use subdirectories of this directory as buckets instead of S3
    #[arg(long)]
    root: Option<PathBuf>,

    /// Only transfer keys starting with this prefix
    #[arg(long)]
    prefix: Option<String>,

    /// Classify without copying anything
    #[arg(long)]
    dry_run: bool,

    #[cfg(feature = "s3")]
    #[command(flatten)]
    aws: AwsArgs,
}

#[cfg(feature = "s3")]
#[derive(Args)]
struct AwsArgs {
    /// AWS Access Key ID
    #[arg(long, alias = "aws_access_key_id", env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    aws_access_key_id: Option<String>,

    /// AWS Secret Access Key
    #[arg(
        long,
        alias = "aws_secret_access_key",
        env = "AWS_SECRET_ACCESS_KEY",
        hide_env_values = true
    )]
    aws_secret_access_key: Option<String>,

    /// AWS Session Token
    #[arg(long, alias = "aws_session_token", env = "AWS_SESSION_TOKEN", hide_env_values = true)]
    aws_session_token: Option<String>,

    /// AWS region
    #[arg(long, env = "AWS_REGION")]
    region: Option<String>,
}

#[cfg(feature = "faces")]
#[derive(Args)]
struct FacesArgs {
    /// Image file path that will be performed face detection
    #[arg(short = 'i', long)]
    image_file_path: PathBuf,

    /// Directory that the detected images will be saved (default: ./detected-faces)
    #[arg(short = 's', long)]
    save_to_directory: Option<PathBuf>,

    /// SeetaFace model file
    #[arg(short, long, env = "TSIEVE_FACE_MODEL")]
    model: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let level = logging::level_for(cli.verbose, cli.quiet);
    if let Err(e) = logging::init(level, cli.log_file.as_deref()) {
        eprintln!("Fatal: Failed to initialize logging: {e}");
        process::exit(1);
    }

    let ok = match &cli.command {
        Command::Check { input } => run_check(input, &cli),
        Command::Transfer(args) => run_transfer(args, &cli),
        #[cfg(feature = "faces")]
        Command::Faces(args) => run_faces(args),
    };

    if !ok {
        process::exit(1);
    }
}

fn run_check(input: &Path, cli: &Cli) -> bool {
    if !input.exists() {
        eprintln!("Error: Input path does not exist: {}", input.display());
        return false;
    }

    let results = if input.is_dir() {
        check_directory(input)
    } else {
        vec![check_file(input)]
    };

    let mut transparent = 0u32;
    let mut opaque = 0u32;
    let mut failed = 0u32;
    for r in &results {
        print_check_result(r, cli);
        match r.transparent {
            Some(true) => transparent += 1,
            Some(false) => opaque += 1,
            None => failed += 1,
        }
    }

    if results.len() > 1 && !cli.quiet {
        eprintln!();
        eprint!("[Summary] Transparent: {transparent}, Opaque: {opaque}");
        if failed > 0 {
            eprint!(", Failed: {failed}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    failed == 0
}

fn print_check_result(result: &CheckResult, cli: &Cli) {
    if cli.quiet && result.success() {
        return;
    }

    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    match result.transparent {
        Some(true) => eprintln!("[TRANSPARENT] {filename}"),
        Some(false) => eprintln!("[OPAQUE] {filename}"),
        None => eprintln!("[FAIL] {filename}: {}", result.message),
    }

    if cli.verbose && result.success() {
        eprintln!("  -> {}", result.message);
    }
}

fn run_transfer(args: &TransferArgs, cli: &Cli) -> bool {
    let store = match open_store(args) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Fatal: {e}");
            return false;
        }
    };

    let opts = TransferOptions {
        dry_run: args.dry_run,
        prefix: args.prefix.clone(),
    };

    if opts.dry_run && !cli.quiet {
        eprintln!("Dry run: nothing will be copied");
    }

    let results = match transfer(
        &*store,
        &args.src_bucket_name,
        &args.dst_bucket_name,
        &opts,
    ) {
        Ok(results) => results,
        Err(e) => {
            eprintln!("Error: {e}");
            return false;
        }
    };

    for r in &results {
        if let Outcome::Failed(message) = &r.outcome {
            eprintln!("[FAIL] {}: {message}", r.key);
        }
    }

    let (copied, skipped, failed) = summarize(&results);
    if !cli.quiet {
        eprintln!(
            "[Summary] Copied: {copied}, Skipped: {skipped}, Failed: {failed} (Total: {})",
            results.len()
        );
    }

    failed == 0
}

fn open_store(args: &TransferArgs) -> Result<Box<dyn ObjectStore>, String> {
    if let Some(root) = &args.root {
        return Ok(Box::new(LocalStore::new(root)));
    }
    open_s3(args)
}

#[cfg(feature = "s3")]
fn open_s3(args: &TransferArgs) -> Result<Box<dyn ObjectStore>, String> {
    use transparency_sieve::store::{S3Credentials, S3Store};

    let aws = &args.aws;
    let credentials = match (&aws.aws_access_key_id, &aws.aws_secret_access_key) {
        (Some(id), Some(secret)) => Some(S3Credentials {
            access_key_id: id.clone(),
            secret_access_key: secret.clone(),
            session_token: aws.aws_session_token.clone(),
        }),
        (None, None) => None,
        _ => {
            return Err(
                "--aws-access-key-id and --aws-secret-access-key must be given together".into(),
            )
        }
    };

    let store = S3Store::connect(credentials, aws.region.clone()).map_err(|e| e.to_string())?;
    Ok(Box::new(store))
}

#[cfg(not(feature = "s3"))]
fn open_s3(_args: &TransferArgs) -> Result<Box<dyn ObjectStore>, String> {
    Err("built without the `s3` feature; pass --root <dir> to use local buckets".into())
}

#[cfg(feature = "faces")]
fn run_faces(args: &FacesArgs) -> bool {
    use transparency_sieve::faces::{detect_and_save, SeetaDetector};

    let mut detector = match SeetaDetector::from_model(&args.model) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Fatal: {e}");
            return false;
        }
    };

    match detect_and_save(
        &args.image_file_path,
        args.save_to_directory.as_deref(),
        &mut detector,
    ) {
        Ok(report) => {
            eprintln!(
                "[OK] {} face(s) -> {}",
                report.faces.len(),
                report.output.display()
            );
            true
        }
        Err(e) => {
            eprintln!("[FAIL] {}: {e}", args.image_file_path.display());
            false
        }
    }
}
