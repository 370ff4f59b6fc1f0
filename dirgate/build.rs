#[cfg(feature = "man")]
fn build_mangen() -> std::io::Result<()> {
    use clap_builder::CommandFactory;

    let out_dir =
        std::path::PathBuf::from(std::env::var_os("OUT_DIR").ok_or(std::io::ErrorKind::NotFound)?);

    let cmd = dirgate_cli::Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buffer: Vec<u8> = Default::default();
    man.render(&mut buffer)?;

    std::fs::write(out_dir.join("dirgate.1"), buffer)
}

fn main() -> std::io::Result<()> {
    #[cfg(feature = "man")]
    build_mangen()?;

    Ok(())
}
