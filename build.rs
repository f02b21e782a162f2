use vergen::{BuildBuilder, Emitter};
use vergen_git2::Git2Builder;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let build = BuildBuilder::default().build_date(true).build()?;
    let git2 = Git2Builder::default().sha(true).build();

    let mut emitter = Emitter::default();
    emitter.add_instructions(&build)?;
    match git2 {
        Ok(git2) => {
            emitter.add_instructions(&git2)?;
        }
        // Source tarballs have no repository.
        Err(_) => println!("cargo:rustc-env=VERGEN_GIT_SHA=unknown"),
    }
    emitter.emit()?;
    Ok(())
}
