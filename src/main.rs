use anyhow::Result;
use jobsh::{Interpreter, SignalFlags};

fn main() -> Result<()> {
    let signals = SignalFlags::install()?;
    let mut shell = Interpreter::new(signals);
    shell.repl()
}
