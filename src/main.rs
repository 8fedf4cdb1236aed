fn main() -> anyhow::Result<()> {
    pagepulse_lib::run()
}
