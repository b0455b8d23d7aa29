use std::fmt;

/// How the service is deployed. Threaded explicitly through every lifecycle
/// operation instead of being inferred from whichever command ran last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    /// Service plus its infrastructure, from the default compose file.
    FullStack,
    /// Service alone, from the service-only compose file; infra already up.
    ServiceOnly,
    /// One container run directly, outside compose.
    Standalone,
}

impl Topology {
    pub fn label(&self) -> &'static str {
        match self {
            Self::FullStack => "full stack",
            Self::ServiceOnly => "service only",
            Self::Standalone => "standalone",
        }
    }

    pub fn uses_compose(&self) -> bool {
        !matches!(self, Self::Standalone)
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

pub const ENV_ACTIVE_PROFILE: &str = "SPRING_PROFILES_ACTIVE";
pub const ENV_REGISTRY_URL: &str = "EUREKA_CLIENT_SERVICE_URL_DEFAULTZONE";
pub const ENV_DATASOURCE_URL: &str = "SPRING_DATASOURCE_URL";
pub const ENV_DATASOURCE_USERNAME: &str = "SPRING_DATASOURCE_USERNAME";
pub const ENV_DATASOURCE_PASSWORD: &str = "SPRING_DATASOURCE_PASSWORD";

/// Values injected into the standalone container's environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEnv {
    pub active_profile: String,
    pub registry_url: String,
    pub datasource_url: String,
    pub datasource_username: String,
    pub datasource_password: String,
}

impl ServiceEnv {
    /// `KEY=value` pairs in injection order.
    pub fn pairs(&self) -> Vec<String> {
        [
            (ENV_ACTIVE_PROFILE, &self.active_profile),
            (ENV_REGISTRY_URL, &self.registry_url),
            (ENV_DATASOURCE_URL, &self.datasource_url),
            (ENV_DATASOURCE_USERNAME, &self.datasource_username),
            (ENV_DATASOURCE_PASSWORD, &self.datasource_password),
        ]
        .into_iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect()
    }
}

/// The named container managed in `Topology::Standalone`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceContainer {
    pub name: String,
    pub image: String,
    pub network: String,
    pub port: String,
    pub env: ServiceEnv,
}

impl ServiceContainer {
    /// Arguments for `run -d`, without the runtime itself.
    pub fn run_args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "run".into(),
            "-d".into(),
            "--name".into(),
            self.name.clone(),
            "--network".into(),
            self.network.clone(),
            "-p".into(),
            self.port.clone(),
        ];

        for pair in self.env.pairs() {
            args.push("-e".into());
            args.push(pair);
        }

        args.push(self.image.clone());
        args
    }

    /// Host-side port of the mapping, for the "access at" hint. Handles
    /// `host:container` and `ip:host:container`.
    pub fn host_port(&self) -> &str {
        self.port.rsplitn(3, ':').nth(1).unwrap_or(&self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container() -> ServiceContainer {
        ServiceContainer {
            name: "svc".into(),
            image: "acme/svc:latest".into(),
            network: "acme-net".into(),
            port: "8083:8083".into(),
            env: ServiceEnv {
                active_profile: "docker".into(),
                registry_url: "http://registry:8761/eureka/".into(),
                datasource_url: "jdbc:mysql://db:3306/svc?useSSL=false".into(),
                datasource_username: "root".into(),
                datasource_password: "secret".into(),
            },
        }
    }

    #[test]
    fn test_run_args_layout() {
        let args = container().run_args();

        assert_eq!(&args[..8], &[
            "run",
            "-d",
            "--name",
            "svc",
            "--network",
            "acme-net",
            "-p",
            "8083:8083"
        ]);
        assert_eq!(args.last().map(String::as_str), Some("acme/svc:latest"));
        assert_eq!(args.iter().filter(|a| *a == "-e").count(), 5);
    }

    #[test]
    fn test_env_pairs_keep_query_string() {
        let pairs = container().env.pairs();
        assert_eq!(
            pairs[2],
            "SPRING_DATASOURCE_URL=jdbc:mysql://db:3306/svc?useSSL=false"
        );
        assert_eq!(pairs[0], "SPRING_PROFILES_ACTIVE=docker");
    }

    #[test]
    fn test_host_port() {
        assert_eq!(container().host_port(), "8083");

        let mut bound = container();
        bound.port = "127.0.0.1:9090:8083".into();
        assert_eq!(bound.host_port(), "9090");

        bound.port = "8083".into();
        assert_eq!(bound.host_port(), "8083");
    }

    #[test]
    fn test_topology_compose_usage() {
        assert!(Topology::FullStack.uses_compose());
        assert!(Topology::ServiceOnly.uses_compose());
        assert!(!Topology::Standalone.uses_compose());
        assert_eq!(Topology::ServiceOnly.to_string(), "service only");
    }
}
