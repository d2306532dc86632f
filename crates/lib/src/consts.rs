pub const APP_NAME: &str = "swarmpack";

/// Coordinate of the bootstrap runtime every output archive requires.
pub const BOOTSTRAP_GROUP_ID: &str = "org.wildfly.swarm";
pub const BOOTSTRAP_ARTIFACT_ID: &str = "bootstrap";

/// Coordinate of the module-loader runtime.
pub const MODULE_LOADER_GROUP_ID: &str = "org.jboss.modules";
pub const MODULE_LOADER_ARTIFACT_ID: &str = "jboss-modules";

/// Entry prefix whose presence means the bootstrap jar already shades the module loader.
pub const MODULE_LOADER_MARKER: &str = "org/jboss/modules/ModuleLoader";

/// Class launched by the JVM; it reads the generated descriptors.
pub const BOOTSTRAP_MAIN_CLASS: &str = "org.wildfly.swarm.bootstrap.Main";
pub const DEFAULT_MAIN_CLASS: &str = "org.wildfly.swarm.Swarm";

pub const METADATA_DIR: &str = "META-INF/";
pub const JAR_MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";
pub const JAR_MANIFEST_MAIN_CLASS_ATTR: &str = "Wildfly-Swarm-Main-Class";
pub const BUILD_MANIFEST_PATH: &str = "META-INF/wildfly-swarm-manifest.yaml";
pub const PROPERTIES_PATH: &str = "META-INF/wildfly-swarm.properties";
pub const BOOTSTRAP_CONF_PATH: &str = "META-INF/wildfly-swarm-bootstrap.conf";
pub const DEPENDENCIES_CONF_PATH: &str = "META-INF/wildfly-swarm-dependencies.conf";
pub const APPLICATION_CONF_PATH: &str = "META-INF/wildfly-swarm-application.conf";

pub const APP_ARTIFACT_PROPERTY: &str = "swarm.app.artifact";
pub const BUNDLED_DEPENDENCIES_PROPERTY: &str = "swarm.bundled.dependencies";
pub const PROPERTIES_HEADER: &str = "Generated by swarmpack";

pub const PROJECT_ASSET_DIR: &str = "_bootstrap";
pub const MODULES_ROOT: &str = "modules";
pub const EMBEDDED_REPOSITORY_ROOT: &str = "m2repo";
pub const MODULE_DESCRIPTOR_NAME: &str = "module.xml";
pub const OUTPUT_SUFFIX: &str = "-swarm.jar";

/// Search depth for module descriptors under an additional module directory.
pub const MAX_MODULE_SEARCH_DEPTH: usize = 20;
