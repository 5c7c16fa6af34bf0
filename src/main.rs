use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    ktail_lib::run()
}
