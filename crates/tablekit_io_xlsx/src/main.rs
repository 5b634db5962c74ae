fn main() -> anyhow::Result<()> {
    tablekit_io_xlsx::cli::run()
}
