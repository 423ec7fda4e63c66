//!
//! petify CLI binary
//! ------------------
//! Issue a single request against the Petify backend through the authenticated
//! client, either anonymously, with a bearer token, or after an email/password
//! sign-in against the identity toolkit. Prints the JSON body on success and
//! reports any redirect the client triggered on failure.

use std::env;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use reqwest::Method;
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use petify::config::{ENV_API_URL, ENV_IDENTITY_API_KEY};
use petify::identity::{IdentityToolkitProvider, MemorySessionProvider};
use petify::navigation::HistoryNavigator;
use petify::{ApiClient, ClientConfig, IdentityConfig, PublicClient, Session, SessionProvider, SignInMethod};

const ENV_TOKEN: &str = "PETIFY_TOKEN";

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [flags] <METHOD> <PATH>\n\nFlags:\n  --api <url>              Backend origin (default: ${ENV_API_URL})\n  --token <t>              Bearer credential to send (default: ${ENV_TOKEN})\n  --email <e>              Sign in with email/password first (needs ${ENV_IDENTITY_API_KEY})\n  --password <p>           Password for --email\n  -d, --data <json>        JSON request body\n  --public                 Send without credential and without sign-out/redirect handling\n  -h, --help               Show this help\n\nExamples:\n  {program} --token abc123 GET '/pets?email=x@y.com'\n  {program} POST /users --data '{{\"name\":\"A\",\"email\":\"a@b.com\"}}' --public\n  {program} --email x@y.com --password secret GET '/payments?email=x@y.com'"
    );
}

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    api: Option<String>,
    token: Option<String>,
    email: Option<String>,
    password: Option<String>,
    data: Option<String>,
    public: bool,
    help: bool,
    method: Option<String>,
    path: Option<String>,
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let mut out = CliArgs::default();
    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        let slot = match flag {
            "--api" => Some(&mut out.api),
            "--token" => Some(&mut out.token),
            "--email" => Some(&mut out.email),
            "--password" => Some(&mut out.password),
            "--data" | "-d" => Some(&mut out.data),
            _ => None,
        };
        if let Some(slot) = slot {
            let Some(v) = args.get(i + 1) else { return Err(format!("{} requires a value", flag)); };
            *slot = Some(v.clone());
            i += 2;
            continue;
        }
        match flag {
            "--public" => out.public = true,
            "-h" | "--help" => out.help = true,
            unk if unk.starts_with("--") => return Err(format!("Unrecognized argument: {}", unk)),
            positional => {
                if out.method.is_none() {
                    out.method = Some(positional.to_string());
                } else if out.path.is_none() {
                    out.path = Some(positional.to_string());
                } else {
                    return Err(format!("Unexpected argument: {}", positional));
                }
            }
        }
        i += 1;
    }
    if out.email.is_some() != out.password.is_some() {
        return Err("--email and --password must be given together".into());
    }
    if out.public && (out.token.is_some() || out.email.is_some()) {
        return Err("--public sends no credential; drop --token/--email/--password".into());
    }
    Ok(out)
}

async fn session_provider(args: &CliArgs) -> Result<Arc<dyn SessionProvider>> {
    if let (Some(email), Some(password)) = (&args.email, &args.password) {
        let cfg = IdentityConfig::from_env()?.ok_or_else(|| anyhow!("{} is required for --email sign-in", ENV_IDENTITY_API_KEY))?;
        let provider = IdentityToolkitProvider::new(cfg)?;
        provider.sign_in(SignInMethod::password(email.as_str(), password.as_str())).await.context("sign-in failed")?;
        return Ok(Arc::new(provider));
    }
    let token = args.token.clone().or_else(|| env::var(ENV_TOKEN).ok()).filter(|t| !t.is_empty());
    let session = match token {
        Some(t) => Session { credential: Some(t), ..Default::default() },
        None => Session::anonymous(),
    };
    Ok(Arc::new(MemorySessionProvider::with_session(session)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let mut argv: Vec<String> = env::args().collect();
    let program = if argv.is_empty() { "petify-cli".to_string() } else { argv.remove(0) };
    let args = match parse_args(&argv) {
        Ok(a) => a,
        Err(msg) => {
            eprintln!("{}", msg);
            print_usage(&program);
            std::process::exit(2);
        }
    };
    if args.help {
        print_usage(&program);
        return Ok(());
    }
    let (Some(method), Some(path)) = (args.method.as_deref(), args.path.as_deref()) else {
        print_usage(&program);
        std::process::exit(2);
    };
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes()).map_err(|_| anyhow!("invalid method '{}'", method))?;
    let body: Option<Value> = match &args.data {
        Some(raw) => Some(serde_json::from_str(raw).context("--data is not valid JSON")?),
        None => None,
    };

    let api_override = args.api.clone();
    let cfg = ClientConfig::from_lookup(|k| match (k, &api_override) {
        (ENV_API_URL, Some(api)) => Some(api.clone()),
        _ => env::var(k).ok(),
    })?;
    info!(target: "petify", "petify-cli: api={} method={} path={} public={}", cfg.base_url, method, path, args.public);

    let result = if args.public {
        PublicClient::new(&cfg)?.request(method, path, body.as_ref(), None).await
    } else {
        let navigator = Arc::new(HistoryNavigator::new(cfg.routes.clone()));
        let sessions = session_provider(&args).await?;
        let client = ApiClient::new(&cfg, sessions, navigator.clone())?;
        let result = client.request(method, path, body.as_ref(), None).await;
        if let Some(target) = navigator.current() {
            eprintln!("redirected to {}", target);
        }
        result
    };

    match result {
        Ok(resp) => {
            println!("{}", serde_json::to_string_pretty(&resp.body)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("request failed: {}", e);
            std::process::exit(1);
        }
    }
}
