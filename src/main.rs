fn main() -> anyhow::Result<()> {
    power_scouter::run()?;
    Ok(())
}
