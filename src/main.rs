use std::io::{self, BufWriter, Write};

use anyhow::Result;
use log::info;
use symorient::orientation::Orientations;
use symorient::settings;
use symorient::symmetry::Symmetry;

fn main() -> Result<()> {
    env_logger::init();

    let settings = settings::load_config()?;
    info!("{}", settings);

    let symmetry = Symmetry::new(&settings.symmetry)?;

    let angles = if let Some(num) = settings.random {
        let orientations = Orientations::random_uniform(num, settings.seed);
        symmetry.reduce_anglesets(&orientations.eulers, settings.inc_mirror)
    } else if let Some(eulers) = &settings.reduce {
        symmetry.reduce_anglesets(eulers, settings.inc_mirror)
    } else {
        symmetry.even_angles(&settings.sampling())?.to_vec()
    };

    info!(
        "{}: {} orientations (nsym = {}, mirror included: {})",
        symmetry.tag(),
        angles.len(),
        symmetry.nsym(),
        settings.inc_mirror
    );

    let mut out = BufWriter::new(io::stdout().lock());
    for angle in &angles {
        writeln!(out, "{}", angle)?;
    }
    out.flush()?;

    Ok(())
}
