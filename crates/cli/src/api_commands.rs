use {
    anyhow::{Context, Result},
    clap::Args,
    monzo_api::MonzoClient,
    monzo_common::Error,
    monzo_config::{ConfigFile, CredentialSources, Endpoints},
    monzo_oauth::{SessionLoader, TokenStore},
    tracing::debug,
};

#[derive(Args)]
pub struct AccountArgs {
    /// Account to query.
    #[arg(long, env = "MONZO_ACCOUNT_ID")]
    pub account_id: Option<String>,
}

impl AccountArgs {
    fn require(self) -> Result<String> {
        self.account_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::ConfigMissing { field: "account id" }.into())
    }
}

pub async fn handle_accounts() -> Result<()> {
    let client = authenticated_client().await?;
    let body = client.accounts().await.context("failed to fetch accounts")?;
    println!("{body}");
    Ok(())
}

pub async fn handle_balance(args: AccountArgs) -> Result<()> {
    let account_id = args.require()?;
    let client = authenticated_client().await?;
    let body = client
        .balance(&account_id)
        .await
        .context("failed to fetch balance")?;
    println!("{body}");
    Ok(())
}

pub async fn handle_transactions(args: AccountArgs) -> Result<()> {
    let account_id = args.require()?;
    let client = authenticated_client().await?;
    let body = client
        .transactions(&account_id)
        .await
        .context("failed to fetch transactions")?;
    println!("{body}");
    Ok(())
}

async fn authenticated_client() -> Result<MonzoClient> {
    let endpoints = Endpoints::default();
    let file = ConfigFile::load(&monzo_config::config_path()?)?;

    let loader = SessionLoader::new(
        TokenStore::new()?,
        endpoints.token_url,
        CredentialSources::gather(None, None, file),
    );
    let credential = loader.ensure_valid_credential().await?;
    debug!(user_id = %credential.user_id, "using stored credential");
    Ok(MonzoClient::new(endpoints.api_url, &credential))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_account_id() {
        let err = AccountArgs { account_id: None }.require().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("--account-id"));
        assert!(msg.contains("MONZO_ACCOUNT_ID"));
    }

    #[test]
    fn test_empty_account_id_counts_as_missing() {
        let args = AccountArgs {
            account_id: Some(String::new()),
        };
        assert!(args.require().is_err());
    }

    #[test]
    fn test_account_id_passes_through() {
        let args = AccountArgs {
            account_id: Some("acc_00009".into()),
        };
        assert_eq!(args.require().unwrap(), "acc_00009");
    }
}
