fn main() -> anyhow::Result<()> {
    chantier::run()?;
    Ok(())
}
