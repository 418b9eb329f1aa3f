pub mod assemble_areas;

use std::path::Path;

use log::{error, info};

use crate::errors::Result;

/// A processing step that reads its input, transforms it and stores the result in
/// an output directory. Steps whose output is already there are skipped.
pub trait Etl {
    type Input;
    type Output;

    fn etl_name(&self) -> &str;

    fn is_cached(&self, dir: &Path) -> Result<bool>;
    fn clean(&self, dir: &Path) -> Result<()>;

    fn extract(&mut self, dir: &Path) -> Result<Self::Input>;
    fn transform(&mut self, input: Self::Input) -> Result<Self::Output>;
    fn load(&mut self, dir: &Path, output: Self::Output) -> Result<()>;

    fn process(&mut self, dir: &Path) -> Result<()> {
        info!(etl_name = self.etl_name(); "Starting ETL process");
        if self.is_cached(dir)? {
            info!(etl_name = self.etl_name(); "Using cached value");
            return Ok(());
        }

        info!(etl_name = self.etl_name(); "Extracting");
        let input = self.extract(dir).inspect_err(|err| {
            error!(etl_name = self.etl_name(), err = err.message.as_str(); "Extraction failed with error");
        })?;

        info!(etl_name = self.etl_name(); "Transforming");
        let output = self.transform(input).inspect_err(|err| {
            error!(etl_name = self.etl_name(), err = err.message.as_str(); "Transformation failed with error");
        })?;

        info!(etl_name = self.etl_name(); "Loading");
        self.load(dir, output).inspect_err(|err| {
            error!(etl_name = self.etl_name(), err = err.message.as_str(); "Loading failed with error");
        })?;

        info!(etl_name = self.etl_name(); "Process finished");
        Ok(())
    }
}
