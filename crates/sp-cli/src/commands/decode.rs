use sp_twee::codec::decode;

pub fn run(prompt: &str, completion: &str) -> Result<(), String> {
    println!("{}", decode(prompt, completion));
    Ok(())
}
