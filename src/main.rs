use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    tracelens::cli::main()
}
