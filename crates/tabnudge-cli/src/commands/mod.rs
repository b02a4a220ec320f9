pub mod classify;
pub mod config;
pub mod focus;
pub mod session;
pub mod settings;
pub mod simulate;

use std::future::Future;

use serde::Serialize;
use tabnudge_core::integrations::ApiResponse;
use tabnudge_core::popup::describe_api_result;

/// Run one future to completion on a fresh runtime.
pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output, Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    Ok(rt.block_on(future))
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the outcome of a remote call: the popup's one-line text by
/// default, the decoded response with `json`. A failed call still exits
/// non-zero after its line is printed.
pub(crate) fn report(
    result: tabnudge_core::error::Result<ApiResponse>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    match result {
        Ok(response) if json => print_json(&response),
        result => {
            println!("{}", describe_api_result(&result));
            result.map(|_| ()).map_err(Into::into)
        }
    }
}
