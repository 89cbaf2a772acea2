use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Args, Parser, Subcommand};
use rand::Rng;

use wechat_receiver::crypto::{self, AesKey};
use wechat_receiver::xml::{self, Message};

#[derive(Parser)]
#[command(name = "receiver-cli")]
#[command(about = "Signature and envelope tooling for the callback receiver", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the signature over the given parts
    Sign {
        parts: Vec<String>,
    },
    /// Encrypt a payload the way the platform does
    Encrypt {
        #[arg(short, long)]
        key: String,
        #[arg(short, long)]
        id: String,
        plaintext: String,
    },
    /// Decrypt a base64 ciphertext
    Decrypt {
        #[arg(short, long)]
        key: String,
        ciphertext: String,
    },
    /// Send a signed ownership challenge (GET) to a receiver
    Challenge {
        #[command(flatten)]
        target: Target,
        #[arg(short, long, default_value = "hello")]
        echostr: String,
    },
    /// Post a signed message to a receiver and print the reply
    Send {
        #[command(flatten)]
        target: Target,
        /// File holding the <xml> message body
        file: PathBuf,
    },
}

#[derive(Args)]
struct Target {
    #[arg(short, long, default_value = "http://localhost:3000/wechat")]
    url: String,
    #[arg(short, long)]
    token: String,
    /// EncodingAESKey; switches to encrypted mode
    #[arg(short, long)]
    key: Option<String>,
    #[arg(short, long, default_value = "")]
    id: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sign { parts } => {
            println!("{}", crypto::sign(&parts));
        }
        Commands::Encrypt { key, id, plaintext } => {
            let key = AesKey::decode(Some(key.as_str()))?;
            println!("{}", crypto::encrypt(&key, &id, &plaintext));
        }
        Commands::Decrypt { key, ciphertext } => {
            let key = AesKey::decode(Some(key.as_str()))?;
            let opened = crypto::decrypt(&key, &ciphertext)?;
            println!("id: {}", opened.id);
            print_payload(&opened.message)?;
        }
        Commands::Challenge { target, echostr } => {
            let (timestamp, nonce) = fresh_stamp();
            let mut query = vec![("timestamp", timestamp.clone()), ("nonce", nonce.clone())];
            match &target.key {
                Some(key) => {
                    let key = AesKey::decode(Some(key.as_str()))?;
                    let sealed = crypto::encrypt(&key, &target.id, &echostr);
                    let signature = crypto::sign([target.token.as_str(), timestamp.as_str(), nonce.as_str(), sealed.as_str()]);
                    query.push(("msg_signature", signature));
                    query.push(("echostr", sealed));
                }
                None => {
                    query.push(("signature", crypto::sign([target.token.as_str(), timestamp.as_str(), nonce.as_str()])));
                    query.push(("echostr", echostr));
                }
            }

            let res = reqwest::Client::new().get(&target.url).query(&query).send().await?;
            print_response(res).await?;
        }
        Commands::Send { target, file } => {
            let message = std::fs::read_to_string(&file)?;
            let (timestamp, nonce) = fresh_stamp();
            let mut query = vec![("timestamp", timestamp.clone()), ("nonce", nonce.clone())];

            let key = target.key.as_deref().map(|k| AesKey::decode(Some(k))).transpose()?;
            let body = match &key {
                Some(key) => {
                    let sealed = crypto::encrypt(key, &target.id, &message);
                    let signature = crypto::sign([target.token.as_str(), timestamp.as_str(), nonce.as_str(), sealed.as_str()]);
                    query.push(("msg_signature", signature));
                    xml::build(&Message::new().with("Encrypt", sealed))
                }
                None => {
                    query.push(("signature", crypto::sign([target.token.as_str(), timestamp.as_str(), nonce.as_str()])));
                    message
                }
            };

            let res = reqwest::Client::new()
                .post(&target.url)
                .query(&query)
                .header("content-type", "application/xml")
                .body(body)
                .send()
                .await?;

            let status = res.status();
            let text = res.text().await?;
            if !status.is_success() {
                eprintln!("Error: receiver returned status {}", status);
                eprintln!("Response: {}", text);
                return Ok(());
            }
            match key.as_ref().and_then(|key| open_envelope(key, &text)) {
                Some(inner) => print_payload(&inner)?,
                None => print_payload(&text)?,
            }
        }
    }

    Ok(())
}

fn fresh_stamp() -> (String, String) {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let nonce: u32 = rand::thread_rng().gen();
    (timestamp.to_string(), nonce.to_string())
}

fn open_envelope(key: &AesKey, body: &str) -> Option<String> {
    let envelope = xml::parse_root(body)?;
    let sealed = envelope.get_str("Encrypt")?;
    crypto::decrypt(key, sealed).ok().map(|opened| opened.message)
}

/// Pretty-print XML payloads as JSON; anything else verbatim.
fn print_payload(payload: &str) -> Result<(), Box<dyn std::error::Error>> {
    match xml::parse_root(payload) {
        Some(message) => println!("{}", serde_json::to_string_pretty(&message.to_json())?),
        None => println!("{}", payload),
    }
    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: receiver returned status {}", status);
        eprintln!("Response: {}", text);
        return Ok(());
    }
    println!("{}", text);
    Ok(())
}
