pub mod csv_tables;
pub mod osm_to_csv;
pub mod read_osm;
pub mod shape;
pub mod tag_classifier;
pub mod validate;

use log::{info, error};

use crate::errors::Result;


/// Streaming extract-transform-load: inputs are pulled one at a time, each is
/// transformed and loaded before the next one is read.
pub trait Etl {
    type Input;
    type Output;
    type Source: Iterator<Item = Result<Self::Input>>;
    type Sink;

    fn etl_name(&self) -> &str;

    fn extract(&mut self) -> Result<Self::Source>;
    fn open_sink(&mut self) -> Result<Self::Sink>;
    /// `Ok(None)` means the input is skipped.
    fn transform(&mut self, input: Self::Input) -> Result<Option<Self::Output>>;
    fn load(&mut self, sink: &mut Self::Sink, output: Self::Output) -> Result<()>;
    fn close_sink(&mut self, sink: Self::Sink) -> Result<()>;

    fn process(&mut self) -> Result<()> {
        info!(etl_name = self.etl_name(); "Starting ETL process");

        info!(etl_name = self.etl_name(); "Opening outputs");
        let mut sink = match self.open_sink() {
            Ok(sink) => Ok(sink),
            Err(err) => {
                error!(etl_name = self.etl_name(), err = err.message.as_str(); "Opening outputs failed with error");
                Err(err)
            },
        }?;

        info!(etl_name = self.etl_name(); "Extracting");
        let source = match self.extract() {
            Ok(source) => Ok(source),
            Err(err) => {
                error!(etl_name = self.etl_name(), err = err.message.as_str(); "Extraction failed with error");
                Err(err)
            },
        }?;

        let mut extracted: u64 = 0;
        let mut loaded: u64 = 0;
        for input_res in source {
            let input = match input_res {
                Ok(input) => Ok(input),
                Err(err) => {
                    error!(etl_name = self.etl_name(), extracted = extracted, err = err.message.as_str(); "Extraction failed with error");
                    Err(err)
                },
            }?;
            extracted += 1;

            let output = match self.transform(input) {
                Ok(output) => Ok(output),
                Err(err) => {
                    error!(etl_name = self.etl_name(), extracted = extracted, err = err.message.as_str(); "Transformation failed with error");
                    Err(err)
                },
            }?;
            let Some(output) = output else {
                continue;
            };

            match self.load(&mut sink, output) {
                Ok(_) => Ok(()),
                Err(err) => {
                    error!(etl_name = self.etl_name(), extracted = extracted, err = err.message.as_str(); "Loading failed with error");
                    Err(err)
                },
            }?;
            loaded += 1;
        }

        match self.close_sink(sink) {
            Ok(_) => Ok(()),
            Err(err) => {
                error!(etl_name = self.etl_name(), err = err.message.as_str(); "Closing outputs failed with error");
                Err(err)
            },
        }?;
        info!(etl_name = self.etl_name(), extracted = extracted, loaded = loaded; "Process finished");
        Ok(())
    }
}
