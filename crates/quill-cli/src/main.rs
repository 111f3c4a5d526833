fn main() -> anyhow::Result<()> {
    quill_cli::run_cli()
}
