//! Build script for the checkout storefront.
//!
//! Fingerprints `static/css/main.css` so the page can reference it by a
//! content-addressed file name and serve it with a long cache lifetime.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Hex digits of the SHA-256 kept in the file name.
const HASH_LEN: usize = 8;

fn main() {
    let manifest_dir = PathBuf::from(
        env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR must be set by Cargo"),
    );
    let css_path = manifest_dir.join("static/css/main.css");
    println!("cargo:rerun-if-changed={}", css_path.display());

    match fingerprint(&css_path, &manifest_dir.join("static/css/derived")) {
        Ok(hash) => println!("cargo:rustc-env=CSS_HASH={hash}"),
        Err(e) => {
            println!("cargo:warning=Could not fingerprint main.css: {e}");
            println!("cargo:rustc-env=CSS_HASH=");
        }
    }
}

/// Copy `source` into `derived_dir` as `main.<hash>.css` and return the hash.
fn fingerprint(source: &Path, derived_dir: &Path) -> io::Result<String> {
    let content = fs::read(source)?;
    let digest = format!("{:x}", Sha256::digest(&content));
    let hash = digest.get(..HASH_LEN).unwrap_or(&digest).to_string();

    fs::create_dir_all(derived_dir)?;
    fs::write(derived_dir.join(format!("main.{hash}.css")), &content)?;
    Ok(hash)
}
