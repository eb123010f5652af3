//! Build script for guanka-cli.
//!
//! Emits the metadata shown by `guanka --version`:
//! - Build date
//! - Rustc version
//! - Git commit of the guanka checkout

use vergen_git2::{Emitter, Git2Builder};

fn main() -> anyhow::Result<()> {
    let build = vergen::BuildBuilder::default().build_date(true).build()?;
    let rustc = vergen::RustcBuilder::default().semver(true).build()?;

    vergen::Emitter::default()
        .add_instructions(&build)?
        .add_instructions(&rustc)?
        .emit()?;

    let git2 = Git2Builder::default().sha(true).build()?;
    Emitter::default().add_instructions(&git2)?.emit()?;

    Ok(())
}
