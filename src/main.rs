fn main() -> anyhow::Result<()> {
    brewflow_lib::run()
}
