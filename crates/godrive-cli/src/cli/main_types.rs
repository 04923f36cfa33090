use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "godrive")]
#[command(about = "Command line client for the GoDrive driving-instructor marketplace")]
#[command(version)]
#[command(after_help = "Examples:
  godrive config set api_url https://api.godrive.com.br
  godrive auth login --email ana@example.com
  godrive instructors search --category B --lat -22.90 --lng -47.06
  godrive instructors show 42
  godrive profile show
  godrive auth logout

Environment Variables:
  GODRIVE_API_URL       Backend base URL
  GODRIVE_TIMEOUT_SECS  Request timeout in seconds
  GODRIVE_EMAIL         Email used by 'auth login'
  GODRIVE_PASSWORD      Password used by 'auth login'")]
pub struct Cli {
    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Profile the session is saved under (default: 'default')
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Custom configuration directory path
    #[arg(long, global = true)]
    pub config_dir: Option<String>,

    /// Backend base URL, overriding the configuration file
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in, sign up and manage the session
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// View and edit your student profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Find instructors and view their details
    Instructors {
        #[command(subcommand)]
        command: InstructorCommands,
    },
    /// Configuration management (show, set)
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Sign in and save the session
    Login {
        #[arg(long, env = "GODRIVE_EMAIL")]
        email: Option<String>,
        /// Prompted for when omitted
        #[arg(long, env = "GODRIVE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        /// Register as an instructor instead of a student
        #[arg(long)]
        instructor: bool,
    },
    /// Request a password reset email
    ForgotPassword { email: String },
    /// Set a new password using the token from the reset email
    ResetPassword {
        #[arg(long)]
        token: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Show the signed-in user, refreshed from the server
    Me,
    /// Sign out and forget the saved session
    Logout,
    /// Show whether a session is saved, without contacting the server
    Status,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// Show your student profile
    Show,
    /// Update profile fields; omitted fields are left unchanged
    #[command(after_help = "Examples:
  godrive profile update --phone \"+55 19 99999-0000\"
  godrive profile update --name \"Ana Paula\" --category B")]
    Update {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        avatar_url: Option<String>,
        /// License category you are training for (A-E)
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },
    /// Save your location for proximity search
    Location(LocationArgs),
}

#[derive(Args, Debug)]
pub struct LocationArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    pub lng: f64,
    #[arg(long)]
    pub address: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum InstructorCommands {
    /// Search instructors by name, category, price and distance
    #[command(after_help = "Examples:
  godrive instructors search carlos
  godrive instructors search --category A --max-price 120
  godrive instructors search --lat -23.55 --lng -46.63 --radius 10")]
    Search(SearchArgs),
    /// Show an instructor's profile, pricing and latest reviews
    Show { id: String },
    /// List all reviews of an instructor
    Reviews { id: String },
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Free-text search
    pub query: Option<String>,

    /// License category (A-E)
    #[arg(long, short = 'c', help_heading = "Filters")]
    pub category: Option<String>,

    /// Latitude of the search centre (requires --lng)
    #[arg(long, allow_hyphen_values = true, requires = "lng", help_heading = "Location")]
    pub lat: Option<f64>,

    /// Longitude of the search centre (requires --lat)
    #[arg(long, allow_hyphen_values = true, requires = "lat", help_heading = "Location")]
    pub lng: Option<f64>,

    /// Search radius in kilometres
    #[arg(long, help_heading = "Location")]
    pub radius: Option<f64>,

    #[arg(long, help_heading = "Filters")]
    pub max_price: Option<f64>,

    #[arg(long, help_heading = "Filters")]
    pub min_rating: Option<f64>,

    #[arg(long, default_value = "1", help_heading = "Output Options")]
    pub page: u32,

    /// Maximum number of results per page
    #[arg(long, default_value = "20", help_heading = "Output Options")]
    pub limit: u32,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the current configuration
    Show,
    /// Set a configuration value
    #[command(after_help = "Keys: api_url, timeout_seconds, stale_time_seconds, profile

Examples:
  godrive config set api_url https://api.godrive.com.br
  godrive config set stale_time_seconds 120")]
    Set { key: String, value: String },
}
