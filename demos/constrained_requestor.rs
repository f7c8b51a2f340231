//! Shows a host handing an imp a prefix-contained requestor: the imp lists a folder through the
//! requestor, and an attempt to escape the prefix is refused before any network traffic.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use imp_sandbox::{
	capability::{CapabilityFlag, CapabilityGroup, StorageCapability, combine_flags},
	http::{HttpRequestor, HttpResponseInfo},
	multidict::Multidict,
	requestor::{ConstrainedRequestor, Credentials},
	transport::ReqwestTransport,
};

/// Untrusted addon code: it only ever sees the requestor trait.
async fn list_folder<R>(requestor: &R, folder: &str) -> Result<serde_json::Value>
where
	R: HttpRequestor,
{
	let response = requestor
		.get(&format!("folders/{folder}/items"), Some(Multidict::from([("limit", "50")])), None)
		.await?;

	Ok(response.json_content().await?)
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let listing = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v1/accounts/acct-7/folders/root/items")
				.header("authorization", "Bearer account-token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"items\":[{\"name\":\"thesis.pdf\"},{\"name\":\"data.csv\"}]}");
		})
		.await;
	let granted = combine_flags([CapabilityFlag::Access, CapabilityFlag::Browse])?;

	println!("Declared storage capabilities:");

	for capability in StorageCapability::declared_capability_set().iter() {
		let marker = if granted.capabilities().any(|c| c == *capability) { "granted" } else { "-" };

		println!("  {capability} ({marker}): {}", capability.description);
	}

	let transport = ReqwestTransport::new()?;
	let requestor = ConstrainedRequestor::new(
		&transport,
		&server.url("/v1/accounts/acct-7"),
		Credentials::access_token("account-token"),
	)?;

	println!("Listing: {}.", list_folder(&requestor, "root").await?);

	match requestor.get("../acct-8/folders/root/items", None, None).await {
		Ok(response) => eprintln!("Unexpected response {}.", response.status()),
		Err(err) => println!("Escape attempt refused: {err}."),
	}

	listing.assert_calls_async(1).await;

	Ok(())
}
