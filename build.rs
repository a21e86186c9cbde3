use vergen_gitcl::{CargoBuilder, Emitter};

fn main() -> Result<(), Box<dyn std::error::Error>> {
	let cargo = CargoBuilder::default().target_triple(true).build()?;

	Emitter::default().add_instructions(&cargo)?.emit()?;

	Ok(())
}
