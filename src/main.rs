//! `snapbuy` command-line storefront.
//!
//! Entry point that drives the SnapBuy client from a terminal.

// Allow pedantic clippy warnings that don't add value for this binary
#![allow(clippy::too_many_lines)]

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use snapbuy_client::checkout::{self, CheckoutForm};
use snapbuy_client::client::{Navigator, ProductImage, RecordingNavigator};
use snapbuy_client::config::{AppConfig, ConfigArgs};
use snapbuy_client::store::Theme;
use snapbuy_client::types::{
    Address, AuthRequest, NewProduct, OtpRequest, SignUpRequest, SortDirection,
};
use snapbuy_client::{ApiError, Storefront, validation};

#[derive(Parser, Debug)]
#[command(name = "snapbuy", author, version, about = "SnapBuy storefront client", long_about = None)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with email and password
    Login { email: String, password: String },
    /// Create an account and sign in
    Signup {
        name: String,
        email: String,
        password: String,
        #[arg(long)]
        admin_key: Option<String>,
    },
    /// Email a one-time login link, or redeem one with --token
    LoginLink {
        email: String,
        #[arg(long)]
        token: Option<String>,
    },
    /// Finish an OAuth2 sign-in from the callback URL
    OauthCallback { url: String },
    /// Sign out and forget stored credentials
    Logout,
    /// Show the signed-in user
    Whoami,
    #[command(subcommand)]
    Products(ProductsCommand),
    #[command(subcommand)]
    Cart(CartCommand),
    /// Place an order for everything in the cart
    Checkout(CheckoutArgs),
    /// List your orders
    Orders,
    /// Ask the shopping assistant
    Chat { message: String },
    #[command(subcommand)]
    Otp(OtpCommand),
    /// Show the theme, or switch to the given one
    Theme { theme: Option<Theme> },
}

#[derive(Subcommand, Debug)]
enum ProductsCommand {
    /// One page of the catalog
    List {
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value = "name")]
        sort_by: String,
        #[arg(long)]
        desc: bool,
    },
    /// Keyword search
    Search { query: String },
    /// Product details
    Show { id: i64 },
    /// Suggestions for a partial query, from history and the last results
    Suggest { input: String },
    /// Recent searches
    History {
        #[arg(long)]
        clear: bool,
    },
    /// Add a product to the catalog (admin)
    Create(CreateProductArgs),
    /// Remove a product from the catalog (admin)
    Delete { id: i64 },
    /// Draft a product description
    Describe { name: String, category: String },
    /// Generate a product image and save it to a file
    GenerateImage {
        name: String,
        category: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Output file; defaults to `<name>.<ext>` in the current directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct CreateProductArgs {
    name: String,
    #[arg(long)]
    category: String,
    #[arg(long)]
    price: f64,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long)]
    brand: Option<String>,
    #[arg(long, default_value_t = 0)]
    stock: u32,
    /// Product image to upload
    #[arg(long)]
    image: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum CartCommand {
    /// Add a product, optionally setting its quantity
    Add {
        id: i64,
        #[arg(long)]
        quantity: Option<i64>,
    },
    /// Set a line's quantity (clamped to stock)
    Set { id: i64, quantity: i64 },
    Remove { id: i64 },
    Show,
    Clear,
}

#[derive(clap::Args, Debug)]
struct CheckoutArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    street: Option<String>,
    #[arg(long, requires = "street")]
    city: Option<String>,
    #[arg(long, requires = "street")]
    state: Option<String>,
    #[arg(long, requires = "street")]
    pin_code: Option<String>,
    #[arg(long, requires = "street")]
    country: Option<String>,
    #[arg(long, requires = "street")]
    phone: Option<String>,
    /// Also open a Stripe checkout session in this currency
    #[arg(long)]
    pay: Option<String>,
}

impl CheckoutArgs {
    fn form(&self) -> CheckoutForm {
        let address = self.street.as_ref().map(|street| Address {
            street: street.clone(),
            city: self.city.clone().unwrap_or_default(),
            state: self.state.clone().unwrap_or_default(),
            pin_code: self.pin_code.clone().unwrap_or_default(),
            country: self.country.clone().unwrap_or_default(),
            phone_number: self.phone.clone().unwrap_or_default(),
        });
        CheckoutForm {
            customer_name: self.name.clone(),
            email: self.email.clone(),
            address,
        }
    }
}

#[derive(Subcommand, Debug)]
enum OtpCommand {
    Send { phone: String, email: String },
    Resend { phone: String, email: String },
    Verify {
        phone: String,
        email: String,
        code: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenv();

    // Initialize tracing (M-LOG-STRUCTURED)
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(&cli.config).context("Failed to load configuration")?;
    info!(
        name: "config.loaded",
        base_url = %config.api.base_url,
        storage = %config.storage.path.display(),
        "Configuration loaded"
    );

    let navigator = Arc::new(RecordingNavigator::new());
    let mut storefront = Storefront::open(&config, Arc::clone(&navigator) as Arc<dyn Navigator>)
        .context("Failed to open storefront")?;
    storefront.init();

    let outcome = run(&mut storefront, cli.command).await;
    if let Some(path) = navigator.last() {
        eprintln!("Your session has expired. Sign in again with `snapbuy login` ({path}).");
    }
    outcome
}

async fn run(sf: &mut Storefront, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => {
            let form = AuthRequest { email, password };
            validation::validate_sign_in(&form).map_err(ApiError::from)?;
            let session = sf.session.sign_in(&form).await?;
            println!("Signed in as {} <{}>", session.user.name, session.user.email);
        }
        Command::Signup {
            name,
            email,
            password,
            admin_key,
        } => {
            let form = SignUpRequest {
                name,
                email,
                password,
                admin_key,
                profile_image: None,
                user_address: None,
            };
            validation::validate_sign_up(&form).map_err(ApiError::from)?;
            let session = sf.session.sign_up(&form).await?;
            println!("Welcome, {}", session.user.name);
        }
        Command::LoginLink { email, token } => match token {
            Some(token) => {
                let session = sf.session.login_with_ott(&token).await?;
                println!("Signed in as {}", session.user.email);
            }
            None => {
                if !validation::is_valid_email(&email) {
                    bail!("invalid email address: {email}");
                }
                println!("{}", sf.session.send_login_link(&email).await?);
            }
        },
        Command::OauthCallback { url } => {
            let callback: url::Url = url.parse().context("Invalid callback URL")?;
            let session = sf.session.complete_oauth_callback(&callback)?;
            println!("Signed in as {}", session.user.email);
        }
        Command::Logout => {
            sf.session.logout();
            println!("Signed out");
        }
        Command::Whoami => match sf.session.current() {
            Some(session) => {
                let user = &session.user;
                println!("{} <{}>", user.name, user.email);
                if user.is_admin() {
                    println!("role: admin");
                }
            }
            None => println!("Not signed in"),
        },
        Command::Products(cmd) => products(sf, cmd).await?,
        Command::Cart(cmd) => cart(sf, cmd).await?,
        Command::Checkout(args) => {
            let stripe = args
                .pay
                .as_deref()
                .map(|currency| checkout::stripe_request(&sf.cart, currency))
                .transpose()?;
            let order = checkout::checkout(&sf.client, &mut sf.cart, &args.form()).await?;
            println!("Order {} is {} ({:.2})", order.order_id, order.status, order.total());
            if let Some(request) = stripe {
                let session = sf.client.payments().stripe_session(&request).await?;
                match session.checkout_url() {
                    Some(url) => println!("Pay at {url}"),
                    None => println!("Payment session created"),
                }
            }
        }
        Command::Orders => {
            let orders = sf.client.orders().list().await?;
            if orders.is_empty() {
                println!("No orders yet");
            }
            for order in orders {
                let date = order
                    .order_date
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                println!("{}  {date}  {:<10} {:>10.2}", order.order_id, order.status, order.total());
            }
        }
        Command::Chat { message } => {
            println!("{}", sf.client.chat().ask(&message).await?);
        }
        Command::Otp(cmd) => otp(sf, cmd).await?,
        Command::Theme { theme } => {
            let theme = match theme {
                Some(theme) => {
                    sf.theme.set(theme)?;
                    theme
                }
                None => sf.theme.theme(),
            };
            println!("{theme}");
        }
    }
    Ok(())
}

async fn products(sf: &mut Storefront, cmd: ProductsCommand) -> anyhow::Result<()> {
    match cmd {
        ProductsCommand::List {
            page,
            sort_by,
            desc,
        } => {
            let direction = if desc {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            };
            sf.catalog.set_sort(sort_by, direction);
            for p in sf.catalog.load_page(&sf.client, page).await? {
                println!("{:>6}  {:<40} {:>10.2}  stock {}", p.id, p.name, p.price, p.stock_quantity);
            }
            println!(
                "page {}/{} ({} products)",
                u64::from(sf.catalog.page()) + 1,
                sf.catalog.total_pages().max(1),
                sf.catalog.total_elements()
            );
        }
        ProductsCommand::Search { query } => {
            let results = sf.search.search(&sf.client, &query).await?;
            if results.is_empty() {
                println!("No products match \"{query}\"");
            }
            for p in results {
                println!("{:>6}  {:<40} {:>10.2}", p.id, p.name, p.price);
            }
        }
        ProductsCommand::Show { id } => {
            let p = sf.client.products().get(id).await?;
            println!("{} ({})", p.name, p.category);
            if let Some(brand) = &p.brand {
                println!("brand: {brand}");
            }
            println!("price: {:.2}", p.price);
            println!("stock: {}", p.stock_quantity);
            if !p.description.is_empty() {
                println!("\n{}", p.description);
            }
        }
        ProductsCommand::Suggest { input } => {
            for s in sf.search.suggestions(&input) {
                println!("{:?}\t{}", s.kind, s.text);
            }
        }
        ProductsCommand::History { clear } => {
            if clear {
                sf.search.clear_history();
            }
            for entry in sf.search.history() {
                println!(
                    "{}  {} ({} results)",
                    entry.timestamp.format("%Y-%m-%d %H:%M"),
                    entry.query,
                    entry.results_count
                );
            }
        }
        ProductsCommand::Create(args) => {
            let image = args
                .image
                .as_ref()
                .map(|path| {
                    ProductImage::from_path(path)
                        .with_context(|| format!("Failed to read image {}", path.display()))
                })
                .transpose()?;
            let product = NewProduct {
                name: args.name,
                description: args.description,
                brand: args.brand,
                price: args.price,
                category: args.category,
                stock_quantity: args.stock,
                product_available: args.stock > 0,
            };
            let created = sf.client.products().create(&product, image.as_ref()).await?;
            println!("Created product {} ({})", created.id, created.name);
        }
        ProductsCommand::Delete { id } => {
            sf.client.products().delete(id).await?;
            println!("Deleted product {id}");
        }
        ProductsCommand::Describe { name, category } => {
            let description = sf
                .client
                .products()
                .generate_description(&name, &category)
                .await?;
            println!("{description}");
        }
        ProductsCommand::GenerateImage {
            name,
            category,
            description,
            out,
        } => {
            let image = sf
                .client
                .products()
                .generate_image(&name, &category, &description)
                .await?;
            let path = out.unwrap_or_else(|| {
                PathBuf::from(format!("{name}.{}", image.extension().unwrap_or("img")))
            });
            std::fs::write(&path, &image.data)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Saved {} ({} bytes)", path.display(), image.data.len());
        }
    }
    Ok(())
}

async fn cart(sf: &mut Storefront, cmd: CartCommand) -> anyhow::Result<()> {
    match cmd {
        CartCommand::Add { id, quantity } => {
            let product = sf.client.products().get(id).await?;
            let mut qty = sf.cart.add(&product)?;
            if let Some(wanted) = quantity {
                qty = sf.cart.update_quantity(id, wanted)?;
            }
            println!("{} x{qty}", product.name);
        }
        CartCommand::Set { id, quantity } => {
            let qty = sf.cart.update_quantity(id, quantity)?;
            println!("quantity set to {qty}");
        }
        CartCommand::Remove { id } => sf.cart.remove(id)?,
        CartCommand::Clear => sf.cart.clear()?,
        CartCommand::Show => {
            if sf.cart.is_empty() {
                println!("Cart is empty");
                return Ok(());
            }
            for item in sf.cart.items() {
                println!(
                    "{:>6}  {:<40} x{:<3} {:>10.2}",
                    item.product.id,
                    item.product.name,
                    item.quantity,
                    item.line_total()
                );
            }
            println!("{} items, total {:.2}", sf.cart.total_items(), sf.cart.total_price());
        }
    }
    debug!(items = sf.cart.total_items(), "Cart updated");
    Ok(())
}

async fn otp(sf: &Storefront, cmd: OtpCommand) -> anyhow::Result<()> {
    let response = match cmd {
        OtpCommand::Send { phone, email } => {
            let request = otp_request(phone, email, None)?;
            sf.client.auth().send_otp(&request).await?
        }
        OtpCommand::Resend { phone, email } => {
            let request = otp_request(phone, email, None)?;
            sf.client.auth().resend_otp(&request).await?
        }
        OtpCommand::Verify { phone, email, code } => {
            let request = otp_request(phone, email, Some(code))?;
            let (response, session) = sf.session.verify_otp(&request).await?;
            if let Some(session) = session {
                println!("Signed in as {}", session.user.email);
            }
            response
        }
    };
    println!("{}", response.message);
    if let Some(expires) = response.expires_at {
        println!("expires at {}", expires.format("%H:%M:%S UTC"));
    }
    Ok(())
}

fn otp_request(phone: String, email: String, otp: Option<String>) -> Result<OtpRequest, ApiError> {
    let request = OtpRequest { phone, email, otp };
    validation::validate_otp(&request, request.otp.is_some())?;
    Ok(request)
}
