// std
use std::sync::{
	Mutex,
	atomic::{AtomicUsize, Ordering},
};
// self
use ibm_iam_auth::{
	_preludet::*,
	config::IamConfig,
	credentials::CredentialProvider,
	error::{ConfigError, EndpointError},
	http::TokenHttpClient,
	oauth2::{
		AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
		http::{StatusCode, header::CONTENT_TYPE},
	},
	provider::{GRANT_TYPE, IbmIamProvider, RESPONSE_TYPE},
	url::form_urlencoded,
};

type RequestLog = Arc<Mutex<Vec<HttpRequest>>>;

#[derive(Debug)]
enum FakeTransportError {
	Refused,
}
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Refused => write!(f, "Connection refused."),
		}
	}
}
impl StdError for FakeTransportError {}

#[derive(Clone, Copy)]
enum Script {
	Refuse,
	Respond { status: u16, expiration: i64 },
}

struct FakeHttpClient {
	script: Script,
	calls: Arc<AtomicUsize>,
	requests: RequestLog,
}
impl FakeHttpClient {
	fn new(script: Script) -> Self {
		Self { script, calls: Default::default(), requests: Default::default() }
	}
}
impl TokenHttpClient for FakeHttpClient {
	type Handle = FakeHttpHandle;
	type TransportError = FakeTransportError;

	fn handle(&self) -> Self::Handle {
		FakeHttpHandle {
			script: self.script,
			calls: self.calls.clone(),
			requests: self.requests.clone(),
		}
	}
}

struct FakeHttpHandle {
	script: Script,
	calls: Arc<AtomicUsize>,
	requests: RequestLog,
}
impl<'a> AsyncHttpClient<'a> for FakeHttpHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future = Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send>>;

	fn call(&'a self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);
			self.requests.lock().expect("Request log lock should not be poisoned.").push(request);

			match self.script {
				Script::Refuse =>
					Err(HttpClientError::Reqwest(Box::new(FakeTransportError::Refused))),
				Script::Respond { status, expiration } => {
					let body =
						format!("{{\"access_token\":\"fake-token\",\"expiration\":{expiration}}}");
					let mut response = HttpResponse::new(body.into_bytes());

					*response.status_mut() =
						StatusCode::from_u16(status).expect("Scripted status should be valid.");

					Ok(response)
				},
			}
		})
	}
}

fn provider(
	script: Script,
	endpoint: &str,
) -> (IbmIamProvider<FakeHttpClient>, Arc<AtomicUsize>, RequestLog) {
	let client = FakeHttpClient::new(script);
	let calls = client.calls.clone();
	let requests = client.requests.clone();
	let config = IamConfig::builder("fake key/+=")
		.service_instance_id("fake-instance")
		.iam_endpoint(endpoint)
		.build()
		.expect("Fake IAM configuration should be valid.");
	let provider = IbmIamProvider::with_http_client(config, client)
		.expect("Provider should build with a fake transport.");

	(provider, calls, requests)
}

#[tokio::test]
async fn token_request_posts_fixed_form_to_custom_endpoint() {
	let expiration = OffsetDateTime::now_utc().unix_timestamp() + 600;
	let (provider, calls, requests) =
		provider(Script::Respond { status: 200, expiration }, "https://iam.test.example/");
	let credential = provider.retrieve().await.expect("Scripted exchange should succeed.");

	assert_eq!(credential.session_token.expose(), "fake-token");
	assert_eq!(credential.service_instance_id, "fake-instance");
	assert_eq!(calls.load(Ordering::SeqCst), 1);

	let requests = requests.lock().expect("Request log lock should not be poisoned.");
	let request = requests.first().expect("One request should be recorded.");
	let form = form_urlencoded::parse(request.body()).into_owned().collect::<Vec<_>>();

	assert_eq!(request.method(), "POST");
	assert_eq!(request.uri().to_string(), "https://iam.test.example/oidc/token");
	assert_eq!(
		request.headers().get(CONTENT_TYPE).and_then(|value| value.to_str().ok()),
		Some("application/x-www-form-urlencoded")
	);
	assert_eq!(
		form,
		vec![
			("grant_type".to_owned(), GRANT_TYPE.to_owned()),
			("response_type".to_owned(), RESPONSE_TYPE.to_owned()),
			("apikey".to_owned(), "fake key/+=".to_owned()),
		]
	);
}

#[tokio::test]
async fn transport_failures_surface_without_retry() {
	let (provider, calls, _requests) = provider(Script::Refuse, "https://iam.test.example");
	let err = provider.retrieve().await.expect_err("Refused connection should fail.");

	match err {
		Error::Endpoint(ref endpoint @ EndpointError::Transport { .. }) => {
			assert_eq!(endpoint.http_status(), None);
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	assert_eq!(calls.load(Ordering::SeqCst), 1, "Provider must not retry failed exchanges.");
	assert!(provider.is_expired());
}

#[tokio::test]
async fn every_retrieve_issues_a_new_request() {
	let expiration = OffsetDateTime::now_utc().unix_timestamp() + 600;
	let (provider, calls, _requests) =
		provider(Script::Respond { status: 200, expiration }, "https://iam.test.example");
	let provider = Arc::new(provider);
	let (first, second) = tokio::join!(provider.retrieve(), provider.retrieve());

	first.expect("First concurrent exchange should succeed.");
	second.expect("Second concurrent exchange should succeed.");

	assert_eq!(calls.load(Ordering::SeqCst), 2, "Concurrent retrievals are not coalesced.");
	assert!(!provider.is_expired());
}

#[test]
fn invalid_custom_endpoint_is_rejected() {
	let config = IamConfig {
		iam_endpoint: Some("::not-a-url".into()),
		..IamConfig::new("fake key")
	};
	let client = FakeHttpClient::new(Script::Refuse);
	let err = IbmIamProvider::<FakeHttpClient>::with_http_client(config, client)
		.expect_err("Unparsable endpoint should be rejected.");

	assert!(matches!(err, Error::Config(ConfigError::InvalidEndpoint { .. })));
}
