quantity!(Celsius, suffix: "°C", precision: 1);

impl Celsius {
    /// Reference cell temperature of the standard test conditions.
    pub const STC: Self = Self(25.0);
}
