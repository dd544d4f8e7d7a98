#![deny(warnings)]

use std::io::Read;
use std::path::PathBuf;
use std::process::exit;

use structopt::StructOpt;

use git_version::git_version;
use jffs2_core::Image;

/// List or extract a JFFS2 image.
#[derive(Debug, StructOpt)]
#[structopt(about = "List or extract a JFFS2 flash filesystem image.")]
struct Opt {
    /// List the contents of the image.
    #[structopt(short = "t")]
    list: bool,

    /// Extract the contents of the image to the current (or -C) directory.
    #[structopt(short = "x")]
    extract: bool,

    /// Image file; reads standard input if omitted.
    #[structopt(short = "f", parse(from_os_str))]
    file: Option<PathBuf>,

    /// Change to this directory before listing or extracting.
    #[structopt(short = "C", parse(from_os_str))]
    chdir: Option<PathBuf>,

    /// Verbose listing output.
    #[structopt(short = "v")]
    verbose: bool,

    /// Target paths within the image; defaults to the root.
    paths: Vec<String>,

    #[structopt(long = "git-version")]
    git_version: bool,
}

fn main() {
    env_logger::init();
    let opt = Opt::from_args();

    if opt.git_version {
        println!("{}", git_version!(fallback = "unknown"));
        return;
    }

    if !is_exactly_one_mode(opt.list, opt.extract) {
        eprintln!("jffs2-cli: exactly one of -t or -x is required");
        exit(255);
    }

    if let Some(dir) = &opt.chdir {
        if let Err(e) = std::env::set_current_dir(dir) {
            eprintln!("jffs2-cli: cannot change directory to {}: {e}", dir.display());
            exit(255);
        }
    }

    let bytes = match read_image(opt.file.as_deref()) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("jffs2-cli: cannot read image: {e}");
            exit(1);
        }
    };
    let img = Image::new(&bytes);

    let targets: Vec<String> = if opt.paths.is_empty() {
        vec!["/".to_string()]
    } else {
        opt.paths.iter().map(|p| format!("/{p}")).collect()
    };

    let mut failures = 0u32;
    for target in &targets {
        let result = if opt.list {
            let now = current_time();
            jffs2_core::list(img, Some(target), now, opt.verbose)
        } else {
            jffs2_core::extract(img, Some(target), &std::env::current_dir().unwrap(), opt.verbose)
        };
        if let Err(e) = result {
            eprintln!("jffs2-cli: {target}: {e}");
            failures += 1;
        }
    }

    if failures > 0 {
        exit(1);
    }
}

/// `-t` and `-x` are mutually exclusive and one of them is required.
fn is_exactly_one_mode(list: bool, extract: bool) -> bool {
    list != extract
}

fn read_image(path: Option<&std::path::Path>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    match path {
        Some(p) => {
            std::fs::File::open(p)?.read_to_end(&mut buf)?;
        }
        None => {
            std::io::stdin().lock().read_to_end(&mut buf)?;
        }
    }
    Ok(buf)
}

/// Seconds since the Unix epoch, for the listing visitor's "recent vs.
/// stale" ctime formatting rule.
fn current_time() -> u32 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as u32)
        .unwrap_or(0)
}
