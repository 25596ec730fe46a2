use {
    anyhow::{Context, Result},
    clap::Args,
    monzo_config::{ConfigFile, CredentialSources, Endpoints},
    monzo_oauth::{AuthorizationRequest, LoginFlow, LoginOptions, TokenStore},
    secrecy::SecretString,
    tracing::warn,
};

#[derive(Args)]
pub struct LoginArgs {
    /// OAuth client id. Falls back to MONZO_CLIENT_ID, then the config file.
    #[arg(long)]
    pub client_id: Option<String>,

    /// OAuth client secret. Falls back to MONZO_CLIENT_SECRET, then the config file.
    #[arg(long)]
    pub client_secret: Option<String>,

    /// Redirect URI registered with the client. Defaults to
    /// http://localhost:<port>/callback.
    #[arg(long)]
    pub redirect_uri: Option<String>,

    /// Local port for the authorization callback.
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
}

pub async fn handle_login(args: LoginArgs) -> Result<()> {
    let file = ConfigFile::load(&monzo_config::config_path()?)?;
    let client = CredentialSources::gather(
        args.client_id,
        args.client_secret.map(SecretString::new),
        file,
    )
    .resolve()?;

    let options = LoginOptions {
        redirect_uri: args.redirect_uri,
        ..LoginOptions::new(client, args.port)
    };
    let store = TokenStore::new()?;
    let flow = LoginFlow::new(options, Endpoints::default());

    let credential = flow
        .run(&store, present)
        .await
        .context("login failed")?;

    println!("\nLogin successful!");
    println!("User ID: {}", credential.user_id);
    println!("Token expires in: {} seconds", credential.expires_in);
    println!("Credentials saved to {}", store.path().display());
    println!("\nNote: you may need to approve access in the Monzo app before API calls succeed.");
    Ok(())
}

fn present(req: &AuthorizationRequest) {
    println!("Opening browser for Monzo authorization...");
    println!("If the browser doesn't open, visit this URL:\n\n{}\n", req.url);
    if let Err(e) = open::that(req.url.as_str()) {
        warn!(error = %e, "could not open browser");
    }
    println!("Waiting for authorization on {} ...", req.redirect_uri);
}
