use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(UserRole {
    Abogado => "abogado",
    Cliente => "cliente",
});

str_enum!(AppointmentStatus {
    Pendiente => "pendiente",
    Confirmada => "confirmada",
    Completada => "completada",
    Cancelada => "cancelada",
});

str_enum!(Specialty {
    Penal => "penal",
    Civil => "civil",
    Laboral => "laboral",
    Mercantil => "mercantil",
    Administrativo => "administrativo",
    Familiar => "familiar",
    Inmobiliario => "inmobiliario",
    Fiscal => "fiscal",
    Constitucional => "constitucional",
    Internacional => "internacional",
});

impl AppointmentStatus {
    /// Statuses reachable from the current one. `Completada` and
    /// `Cancelada` are terminal.
    pub fn valid_transitions(&self) -> &'static [AppointmentStatus] {
        match self {
            AppointmentStatus::Pendiente => {
                &[AppointmentStatus::Confirmada, AppointmentStatus::Cancelada]
            }
            AppointmentStatus::Confirmada => {
                &[AppointmentStatus::Completada, AppointmentStatus::Cancelada]
            }
            AppointmentStatus::Completada | AppointmentStatus::Cancelada => &[],
        }
    }

    pub fn can_transition_to(&self, next: AppointmentStatus) -> bool {
        self.valid_transitions().contains(&next)
    }

    /// An appointment still holds its slot reservation unless cancelled.
    pub fn holds_slot(&self) -> bool {
        *self != AppointmentStatus::Cancelada
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn user_role_round_trip() {
        for (variant, s) in [
            (UserRole::Abogado, "abogado"),
            (UserRole::Cliente, "cliente"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(UserRole::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn appointment_status_round_trip() {
        for (variant, s) in [
            (AppointmentStatus::Pendiente, "pendiente"),
            (AppointmentStatus::Confirmada, "confirmada"),
            (AppointmentStatus::Completada, "completada"),
            (AppointmentStatus::Cancelada, "cancelada"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(AppointmentStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn specialty_round_trip() {
        for (variant, s) in [
            (Specialty::Penal, "penal"),
            (Specialty::Familiar, "familiar"),
            (Specialty::Internacional, "internacional"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(Specialty::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn invalid_enum_returns_error() {
        assert!(UserRole::from_str("admin").is_err());
        assert!(AppointmentStatus::from_str("agendada").is_err());
        assert!(Specialty::from_str("").is_err());
    }

    #[test]
    fn pending_can_confirm_or_cancel() {
        let s = AppointmentStatus::Pendiente;
        assert!(s.can_transition_to(AppointmentStatus::Confirmada));
        assert!(s.can_transition_to(AppointmentStatus::Cancelada));
        assert!(!s.can_transition_to(AppointmentStatus::Completada));
        assert!(!s.can_transition_to(AppointmentStatus::Pendiente));
    }

    #[test]
    fn confirmed_can_complete_or_cancel() {
        let s = AppointmentStatus::Confirmada;
        assert!(s.can_transition_to(AppointmentStatus::Completada));
        assert!(s.can_transition_to(AppointmentStatus::Cancelada));
        assert!(!s.can_transition_to(AppointmentStatus::Pendiente));
    }

    #[test]
    fn terminal_states_have_no_transitions() {
        assert!(AppointmentStatus::Completada.valid_transitions().is_empty());
        assert!(AppointmentStatus::Cancelada.valid_transitions().is_empty());
        // Un-cancelling is rejected
        assert!(!AppointmentStatus::Cancelada.can_transition_to(AppointmentStatus::Pendiente));
    }

    #[test]
    fn cancelled_releases_slot() {
        assert!(AppointmentStatus::Pendiente.holds_slot());
        assert!(AppointmentStatus::Confirmada.holds_slot());
        assert!(AppointmentStatus::Completada.holds_slot());
        assert!(!AppointmentStatus::Cancelada.holds_slot());
    }
}
