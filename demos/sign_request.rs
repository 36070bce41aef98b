//! Signs an object-storage request with a token exchanged at a mock IAM endpoint.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use ibm_iam_auth::{
	config::IamConfig,
	ext::Operation,
	http::ReqwestHttpClient,
	oauth2::http::Request,
	provider::IbmIamProvider,
	signer::{IbmIamSigner, SERVICE_INSTANCE_ID_HEADER},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oidc/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"Bearer\",\"expiration\":4102444800}",
			);
		})
		.await;
	let config = IamConfig::builder("demo-api-key")
		.service_instance_id("crn:v1:bluemix:public:cloud-object-storage:global:a/demo::")
		.iam_endpoint(server.url(""))
		.expiry_window(time::Duration::seconds(30))
		.build()?;
	let provider =
		IbmIamProvider::<ReqwestHttpClient>::with_http_client(config, ReqwestHttpClient::default())?;
	let signer = IbmIamSigner::new(Arc::new(provider.into_credentials()));
	let mut request = Request::builder()
		.method("PUT")
		.uri("https://s3.us.cloud-object-storage.appdomain.cloud/demo-bucket")
		.body(Vec::<u8>::new())?;

	signer.sign(&mut request, &Operation::new(Operation::CREATE_BUCKET)).await?;

	println!("Authorization: {:?}.", request.headers().get("authorization"));
	println!(
		"{SERVICE_INSTANCE_ID_HEADER}: {:?}.",
		request.headers().get(SERVICE_INSTANCE_ID_HEADER)
	);

	token_mock.assert_async().await;

	Ok(())
}
