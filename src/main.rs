use minish::Interpreter;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut shell = Interpreter::default();
    shell.repl()?;
    Ok(())
}
