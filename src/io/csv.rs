/*!
# Saving Particle Populations to CSV

Writes one population snapshot (for example the proposals of the last step together with their
normalized weights) as a CSV file. Enable via the `csv` feature.
*/

use csv::Writer;
use ndarray::{ArrayView1, ArrayView2, Axis};
use std::fs::File;

use crate::error::{Result, SmcError};

/**
Saves a particle population and its weights as a CSV file.

The resulting CSV file will have:
- A header row containing `"particle"`, `"weight"`, and one column per dimension
  named `"dim_0"`, `"dim_1"`, etc.
- One row per particle, in population order.

# Examples

```rust
use ndarray::{arr1, arr2};
use smc_logistic::io::csv::save_population_csv;

let population = arr2(&[[0.5, -1.0], [1.5, 2.0]]);
let weights = arr1(&[0.25, 0.75]);
save_population_csv(population.view(), weights.view(), "/tmp/population.csv").unwrap();
```
*/
pub fn save_population_csv(
    population: ArrayView2<f64>,
    weights: ArrayView1<f64>,
    filename: &str,
) -> Result<()> {
    if population.nrows() != weights.len() {
        return Err(SmcError::ShapeMismatch(format!(
            "{} weights for {} particles",
            weights.len(),
            population.nrows()
        )));
    }
    let mut wtr = Writer::from_writer(File::create(filename)?);
    let n_dims = population.ncols();

    let mut header: Vec<String> = vec!["particle".to_string(), "weight".to_string()];
    header.extend((0..n_dims).map(|i| format!("dim_{}", i)));
    wtr.write_record(&header)?;

    for (idx, (particle, weight)) in population
        .axis_iter(Axis(0))
        .zip(weights.iter())
        .enumerate()
    {
        let mut row = vec![idx.to_string(), weight.to_string()];
        row.extend(particle.iter().map(|v| v.to_string()));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, arr2, Array1, Array2};
    use std::fs;
    use tempfile::NamedTempFile;

    #[test]
    fn test_save_population_csv() {
        let population = arr2(&[[1.0, 2.0], [3.5, -4.0]]);
        let weights = arr1(&[0.5, 0.5]);
        let file = NamedTempFile::new().expect("Could not create temp file");
        let filename = file.path().to_str().unwrap();

        save_population_csv(population.view(), weights.view(), filename).unwrap();

        let contents = fs::read_to_string(filename).unwrap();
        let expected = "\
particle,weight,dim_0,dim_1
0,0.5,1,2
1,0.5,3.5,-4";
        assert_eq!(contents.trim(), expected);
    }

    #[test]
    fn test_save_population_csv_empty() {
        let population = Array2::<f64>::zeros((0, 3));
        let weights = Array1::<f64>::zeros(0);
        let file = NamedTempFile::new().expect("Could not create temp file");
        let filename = file.path().to_str().unwrap();

        save_population_csv(population.view(), weights.view(), filename).unwrap();
        let contents = fs::read_to_string(filename).unwrap();
        assert_eq!(contents.trim(), "particle,weight,dim_0,dim_1,dim_2");
    }

    #[test]
    fn test_save_population_csv_rejects_mismatch() {
        let population = arr2(&[[1.0]]);
        let weights = arr1(&[0.5, 0.5]);
        assert!(matches!(
            save_population_csv(population.view(), weights.view(), "/tmp/never_written.csv"),
            Err(SmcError::ShapeMismatch(_))
        ));
    }
}
