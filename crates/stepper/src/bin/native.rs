fn main() -> anyhow::Result<()> {
    stepper::native::run()
}
