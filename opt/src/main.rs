use std::io::{BufWriter, Write};

use aignite::aig::Aig;
use aignite::aig_depth::DepthMap;
use aignite::aig_transform;

fn main() {
    let mut args = std::env::args().skip(1);
    let Some(input) = args.next() else {
        eprintln!("usage: opt <input.aag> [output.aag]");
        std::process::exit(1);
    };
    let output = args.next();

    let mut aig = match Aig::from_aiger_path(&input) {
        Ok(aig) => aig,
        Err(error) => {
            eprintln!("{input}: {error}");
            std::process::exit(1);
        }
    };

    let depth = DepthMap::compute(&aig);
    println!("{}: {} gates, depth {}", input, aig.gate_count(), depth.depth());

    let rewrites = aig_transform::rewrite(&mut aig);
    aig.cleanup();

    let depth = DepthMap::compute(&aig);
    println!(
        "{}: {} gates, depth {} after {} rewrites",
        input,
        aig.gate_count(),
        depth.depth(),
        rewrites
    );

    if let Some(path) = output {
        let result = std::fs::File::create(&path)
            .map(BufWriter::new)
            .and_then(|mut writer| {
                aig.write_aag(&mut writer)?;
                writer.flush()
            });
        if let Err(error) = result {
            eprintln!("{path}: {error}");
            std::process::exit(1);
        }
    }
}
