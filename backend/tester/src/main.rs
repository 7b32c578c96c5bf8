use anyhow::{Result, bail, ensure};
use clap::Parser;
use reqwest::{Client, Response, StatusCode, header::LOCATION, redirect::Policy};

#[derive(Parser, Debug)]
#[command(author, version, about = "Walks a running recipe book through the Pancakes scenario")]
struct Args {
    #[arg(long, default_value = "http://localhost:8080")]
    base_url: String,

    #[arg(long, default_value = "Pancakes")]
    title: String,
}

const FIRST_BODY: &str = "flour, eggs, milk";
const SECOND_BODY: &str = "flour, eggs, milk, sugar";

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let client = Client::builder().redirect(Policy::none()).build()?;
    let url = |route: &str| recipe_url(&args.base_url, route, &args.title);

    println!("Saving {}", args.title);
    let res = client
        .post(url("save"))
        .form(&[("body", FIRST_BODY)])
        .send()
        .await?;
    expect_redirect(&res, "/view/")?;

    println!("Viewing {}", args.title);
    let html = expect_page(client.get(url("view")).send().await?).await?;
    ensure!(html.contains(FIRST_BODY), "view is missing the saved body");

    println!("Editing {}", args.title);
    let html = expect_page(client.get(url("edit")).send().await?).await?;
    ensure!(html.contains(FIRST_BODY), "edit form is not pre-filled");

    println!("Updating {}", args.title);
    let res = client
        .post(url("save"))
        .form(&[("body", SECOND_BODY)])
        .send()
        .await?;
    expect_redirect(&res, "/view/")?;

    let html = expect_page(client.get(url("view")).send().await?).await?;
    ensure!(html.contains(SECOND_BODY), "view is missing the updated body");

    println!("Deleting {}", args.title);
    let html = expect_page(client.get(url("delete")).send().await?).await?;
    ensure!(html.contains("recipe deleted"), "delete did not report success");

    println!("Viewing deleted {}", args.title);
    expect_redirect(&client.get(url("view")).send().await?, "/edit/")?;

    println!("All steps passed");

    Ok(())
}

fn recipe_url(base_url: &str, route: &str, title: &str) -> String {
    format!(
        "{}/{route}/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(title)
    )
}

fn expect_redirect(res: &Response, prefix: &str) -> Result<()> {
    if res.status() != StatusCode::FOUND {
        bail!("{}: expected 302, got {}", res.url(), res.status());
    }

    let location = res
        .headers()
        .get(LOCATION)
        .and_then(|l| l.to_str().ok())
        .unwrap_or_default();
    ensure!(
        location.starts_with(prefix),
        "{}: redirected to {location}, expected {prefix}...",
        res.url()
    );

    Ok(())
}

async fn expect_page(res: Response) -> Result<String> {
    if res.status() != StatusCode::OK {
        bail!("{}: expected 200, got {}", res.url(), res.status());
    }

    Ok(res.text().await?)
}
