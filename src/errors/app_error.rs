use thiserror::Error;
use vkyc_core::CoreEngineError;

/// Errores de la aplicación (configuración, motor y entrada/salida).
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Error de configuración: {0}")]
    Config(String),
    #[error("Error del motor: {0}")]
    Engine(#[from] CoreEngineError),
    #[error("Error en IO: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_variant_format() {
        let err = AppError::Config("VKYC_MAX_ATTEMPTS inválido".into());
        assert_eq!(err.to_string(), "Error de configuración: VKYC_MAX_ATTEMPTS inválido");
    }

    #[test]
    fn test_engine_variant_from() {
        let err: AppError = CoreEngineError::StepNotSuccessful.into();
        assert_eq!(err.to_string(), "Error del motor: current step has no successful outcome");
    }

    #[test]
    fn test_io_variant_from() {
        let io_err = std::io::Error::other("falló IO");
        let err: AppError = io_err.into();
        assert_eq!(err.to_string(), "Error en IO: falló IO");
    }
}
