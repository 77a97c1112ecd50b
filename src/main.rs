fn main() -> anyhow::Result<()> {
    encore::runtime::run()
}
