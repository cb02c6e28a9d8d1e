quantity!(MetersPerSecond, suffix: "m/s", precision: 1);
